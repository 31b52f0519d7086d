//! Enumerations for TUI state management.

/// Application state for the terminal user interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    TaskList,
    AddTask,
    EditTask,
    Dashboard,
    Help,
    Confirm,
}

impl AppState {
    /// Label shown in the status bar when there is no message.
    pub fn label(self) -> &'static str {
        match self {
            AppState::TaskList => "Tasks",
            AppState::AddTask => "Add New Task",
            AppState::EditTask => "Edit Task",
            AppState::Dashboard => "Dashboard",
            AppState::Help => "Help",
            AppState::Confirm => "Confirm Action",
        }
    }
}
