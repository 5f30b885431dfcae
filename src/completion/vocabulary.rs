//! Setting names offered by completion, in presentation order.

/// A completable setting name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingName {
    pub name: &'static str,
    pub description: &'static str,
}

pub(crate) const SETTING_NAMES: &[SettingName] = &[
    SettingName { name: "Documentation", description: "Documentation of the suite or resource file" },
    SettingName { name: "Force Tags", description: "Tags added to every test case in the suite" },
    SettingName { name: "Default Tags", description: "Tags for test cases that do not declare [Tags]" },
    SettingName { name: "Suite Setup", description: "Keyword run before any test in the suite" },
    SettingName { name: "Suite Teardown", description: "Keyword run after all tests in the suite" },
    SettingName { name: "Test Setup", description: "Default keyword run before each test" },
    SettingName { name: "Test Teardown", description: "Default keyword run after each test" },
    SettingName { name: "Library", description: "Import a test library" },
    SettingName { name: "Resource", description: "Import a resource file" },
    SettingName { name: "Variables", description: "Import a variable file" },
    SettingName { name: "Metadata", description: "Free-form suite metadata" },
];
