//! The users table view: a pure mapping from [`FetchState`] to what is drawn.

use std::fmt;

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Cell, Paragraph, Row, Table, Widget, Wrap};

use crate::subscription::query::FetchState;
use crate::users::UserRecord;

pub const LOADING: &str = "Loading...";
pub const ERROR_PREFIX: &str = "An error has occurred: ";
pub const EMPTY: &str = "No available data to display";

/// Render tree of the users table. Built by [`Rendered::from_state`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Loading,
    Error(String),
    Empty,
    Table(UserTable),
}

impl Rendered {
    /// Chooses the branch for `state`, in priority order: pending, error,
    /// empty, table.
    #[must_use]
    pub fn from_state(state: &FetchState<Vec<UserRecord>>) -> Self {
        match state {
            FetchState::Pending => Self::Loading,
            FetchState::Error(message) => Self::Error(message.clone()),
            FetchState::Success { data, .. } if data.is_empty() => Self::Empty,
            FetchState::Success { data, .. } => Self::Table(UserTable::new(data)),
        }
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => f.write_str(LOADING),
            Self::Error(message) => write!(f, "{ERROR_PREFIX}{message}"),
            Self::Empty => f.write_str(EMPTY),
            Self::Table(table) => fmt::Display::fmt(table, f),
        }
    }
}

impl Widget for &Rendered {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self {
            Rendered::Table(table) => table.render(area, buf),
            Rendered::Error(_) => Paragraph::new(self.to_string())
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true })
                .render(area, buf),
            Rendered::Loading | Rendered::Empty => Paragraph::new(self.to_string()).render(area, buf),
        }
    }
}

/// Headers from the first record's fields, one row per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl UserTable {
    /// Records missing a header field get an empty cell; fields the first
    /// record lacks are not shown.
    #[must_use]
    pub fn new(records: &[UserRecord]) -> Self {
        let headers: Vec<String> = records
            .first()
            .map(|first| first.field_names().map(str::to_string).collect())
            .unwrap_or_default();

        let rows = records
            .iter()
            .map(|record| {
                headers
                    .iter()
                    .map(|header| record.field_text(header).unwrap_or_default())
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    fn widths(&self) -> Vec<Constraint> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let widest = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or_default();
                Constraint::Max(u16::try_from(widest).unwrap_or(u16::MAX))
            })
            .collect()
    }
}

impl fmt::Display for UserTable {
    /// Tab-separated header line followed by one line per row.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.headers.join("\t"))?;
        for row in &self.rows {
            writeln!(f, "{}", row.join("\t"))?;
        }
        Ok(())
    }
}

impl Widget for &UserTable {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let header = Row::new(self.headers.iter().map(|h| Cell::from(h.as_str())))
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows = self
            .rows
            .iter()
            .map(|row| Row::new(row.iter().map(|c| Cell::from(c.as_str()))));

        Widget::render(
            Table::new(rows, self.widths())
                .header(header)
                .column_spacing(2),
            area,
            buf,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users(value: serde_json::Value) -> Vec<UserRecord> {
        serde_json::from_value(value).expect("valid users")
    }

    fn success(data: Vec<UserRecord>) -> FetchState<Vec<UserRecord>> {
        FetchState::Success {
            data,
            is_stale: false,
        }
    }

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        (area.top()..area.bottom())
            .map(|y| {
                (area.left()..area.right())
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_pending_renders_loading() {
        let rendered = Rendered::from_state(&FetchState::Pending);
        assert_eq!(rendered, Rendered::Loading);
        assert_eq!(rendered.to_string(), "Loading...");
    }

    #[test]
    fn test_error_renders_message() {
        let rendered = Rendered::from_state(&FetchState::Error("Network Error".to_string()));
        assert_eq!(rendered.to_string(), "An error has occurred: Network Error");
    }

    #[test]
    fn test_empty_renders_empty_state() {
        let rendered = Rendered::from_state(&success(vec![]));
        assert_eq!(rendered, Rendered::Empty);
        assert_eq!(rendered.to_string(), "No available data to display");
    }

    #[test]
    fn test_records_render_one_row_each_in_order() {
        let data = users(json!([
            {"id": 1, "name": "Alice"},
            {"id": 2, "name": "Bob"},
        ]));

        let Rendered::Table(table) = Rendered::from_state(&success(data)) else {
            panic!("expected a table");
        };
        assert_eq!(table.headers, vec!["id", "name"]);
        assert_eq!(table.rows, vec![vec!["1", "Alice"], vec!["2", "Bob"]]);
    }

    #[test]
    fn test_stale_success_still_renders_table() {
        let data = users(json!([{"id": 1, "name": "Alice"}]));
        let state = FetchState::Success {
            data,
            is_stale: true,
        };
        assert!(matches!(Rendered::from_state(&state), Rendered::Table(_)));
    }

    #[test]
    fn test_headers_follow_first_record() {
        let data = users(json!([
            {"id": 1, "name": "Alice", "email": "alice@example.com"},
            {"id": 2, "name": "Bob", "phone": "555-0100"},
        ]));

        let table = UserTable::new(&data);
        assert_eq!(table.headers, vec!["id", "name", "email"]);
        assert_eq!(table.rows[1], vec!["2", "Bob", ""]);
    }

    #[test]
    fn test_render_is_pure() {
        let state = success(users(json!([{"id": 1, "name": "Alice"}])));
        assert_eq!(Rendered::from_state(&state), Rendered::from_state(&state));
    }

    #[test]
    fn test_table_widget_draws_header_and_rows() {
        let data = users(json!([
            {"id": 1, "name": "Alice"},
            {"id": 2, "name": "Bob"},
        ]));
        let rendered = Rendered::from_state(&success(data));

        let mut buf = Buffer::empty(Rect::new(0, 0, 20, 4));
        (&rendered).render(buf.area, &mut buf);
        let text = buffer_text(&buf);
        let lines: Vec<_> = text.lines().collect();

        assert!(lines[0].contains("id") && lines[0].contains("name"));
        assert!(lines[1].contains("Alice"));
        assert!(lines[2].contains("Bob"));
        assert_eq!(lines[3].trim(), "");
    }

    #[test]
    fn test_message_widget_draws_text() {
        let rendered = Rendered::from_state(&FetchState::Error("Network Error".to_string()));
        let mut buf = Buffer::empty(Rect::new(0, 0, 40, 2));
        (&rendered).render(buf.area, &mut buf);

        assert!(buffer_text(&buf).contains("An error has occurred:"));
    }
}
