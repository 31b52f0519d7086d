//! Task form handling for the terminal user interface.
//!
//! This module provides the `TaskForm` structure used for both creating and
//! editing tasks: four text fields in a fixed order, the current focus, and the
//! validation messages from the last submit attempt.

use chrono::NaiveDate;

use crate::filter::format_date;
use crate::format::parse_due_input;
use crate::task::{Task, TaskInput};
use crate::tui::input::InputField;
use crate::validate::{validate_task_form, Field, ValidationReport};

/// Field order in the form, top to bottom.
pub const FIELD_ORDER: [Field; 4] = [Field::Title, Field::Duration, Field::DueDate, Field::Tag];

/// Task form for editing fields
#[derive(Debug, Clone, Default)]
pub struct TaskForm {
    pub title: InputField,
    pub duration: InputField,
    pub due: InputField,
    pub tag: InputField,
    pub current_field: usize,
    /// Task being edited; `None` when adding.
    pub editing: Option<String>,
    pub report: ValidationReport,
}

impl TaskForm {
    /// Empty form for a new task, due today.
    pub fn new(today: NaiveDate) -> Self {
        let mut form = Self {
            due: InputField::with_value(&format_date(today)),
            ..Self::default()
        };
        form.update_active_field();
        form
    }

    /// Create a task form populated from an existing task.
    pub fn from_task(task: &Task) -> Self {
        let input = TaskInput::from_task(task);
        let mut form = Self {
            title: InputField::with_value(&input.title),
            duration: InputField::with_value(&input.duration),
            due: InputField::with_value(&input.due_date),
            tag: InputField::with_value(input.tag_str()),
            editing: Some(task.id.clone()),
            ..Self::default()
        };
        form.update_active_field();
        form
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    pub fn current(&self) -> Field {
        FIELD_ORDER[self.current_field]
    }

    pub fn field(&self, field: Field) -> &InputField {
        match field {
            Field::Title => &self.title,
            Field::Duration => &self.duration,
            Field::DueDate => &self.due,
            Field::Tag => &self.tag,
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut InputField {
        match field {
            Field::Title => &mut self.title,
            Field::Duration => &mut self.duration,
            Field::DueDate => &mut self.due,
            Field::Tag => &mut self.tag,
        }
    }

    fn active_mut(&mut self) -> &mut InputField {
        self.field_mut(self.current())
    }

    /// Move to the next field in the form.
    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_ORDER.len();
        self.update_active_field();
    }

    /// Move to the previous field in the form.
    pub fn prev_field(&mut self) {
        self.current_field = if self.current_field == 0 {
            FIELD_ORDER.len() - 1
        } else {
            self.current_field - 1
        };
        self.update_active_field();
    }

    /// Update which field is currently active for editing.
    pub fn update_active_field(&mut self) {
        let current = self.current();
        for field in FIELD_ORDER {
            self.field_mut(field).active = field == current;
        }
    }

    pub fn handle_char(&mut self, c: char) {
        self.active_mut().handle_char(c);
    }

    pub fn handle_backspace(&mut self) {
        self.active_mut().handle_backspace();
    }

    pub fn handle_delete(&mut self) {
        self.active_mut().handle_delete();
    }

    pub fn handle_left_right(&mut self, right: bool) {
        let field = self.active_mut();
        if right {
            field.move_cursor_right();
        } else {
            field.move_cursor_left();
        }
    }

    /// The raw input, with due-date shorthands ("tomorrow", "in 3d") expanded.
    pub fn to_input(&self, today: NaiveDate) -> TaskInput {
        TaskInput {
            title: self.title.value.clone(),
            duration: self.duration.value.clone(),
            due_date: parse_due_input(&self.due.value, today),
            tag: Some(self.tag.value.clone()),
        }
    }

    /// Validate the form, keep the messages for rendering, and return the input
    /// when every field passes. Focus jumps to the first failing field.
    pub fn submit(&mut self, today: NaiveDate) -> Option<TaskInput> {
        let input = self.to_input(today);
        self.report = validate_task_form(&input.title, &input.duration, &input.due_date, input.tag_str());

        if let Some(first) = self.report.errors.keys().next().copied() {
            if let Some(idx) = FIELD_ORDER.iter().position(|f| *f == first) {
                self.current_field = idx;
                self.update_active_field();
            }
            return None;
        }
        Some(input)
    }
}
