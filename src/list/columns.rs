use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{display_text, resolve_path, Record};

/// Custom cell renderer for a column
#[derive(Clone)]
pub struct CellRenderer(Arc<dyn Fn(&Record) -> String + Send + Sync>);

impl CellRenderer {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&Record) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(render))
    }

    pub fn render(&self, record: &Record) -> String {
        (self.0)(record)
    }
}

impl fmt::Debug for CellRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CellRenderer")
    }
}

/// One list column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    /// Dotted value-path read from each record
    pub path: String,
    #[serde(skip)]
    pub renderer: Option<CellRenderer>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub searchable: bool,
}

impl ColumnDefinition {
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            renderer: None,
            width: None,
            searchable: false,
        }
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub fn render_with<F>(mut self, render: F) -> Self
    where
        F: Fn(&Record) -> String + Send + Sync + 'static,
    {
        self.renderer = Some(CellRenderer::new(render));
        self
    }

    pub fn cell(&self, record: &Record) -> String {
        match &self.renderer {
            Some(renderer) => renderer.render(record),
            None => resolve_path(record, &self.path).map(display_text).unwrap_or_default(),
        }
    }
}

/// Paths of the columns flagged searchable
pub fn searchable_paths(columns: &[ColumnDefinition]) -> Vec<String> {
    columns
        .iter()
        .filter(|column| column.searchable)
        .map(|column| column.path.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_rendering() {
        let record = json!({"plate": "KSA-123", "violation": {"name": "Expired meter"}, "amount": 150})
            .as_object()
            .cloned()
            .unwrap();

        let plate = ColumnDefinition::new("Plate", "plate").searchable();
        let violation = ColumnDefinition::new("Violation", "violation.name").width(200);
        let amount = ColumnDefinition::new("Amount", "amount")
            .render_with(|r| format!("{} SAR", r["amount"]));
        let missing = ColumnDefinition::new("Officer", "officer.name");

        assert_eq!(plate.cell(&record), "KSA-123");
        assert_eq!(violation.cell(&record), "Expired meter");
        assert_eq!(amount.cell(&record), "150 SAR");
        assert_eq!(missing.cell(&record), "");
        assert_eq!(searchable_paths(&[plate, violation, amount]), vec!["plate".to_string()]);
    }
}
