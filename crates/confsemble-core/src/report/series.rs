/// A named column of y values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub label: String,
    pub values: Vec<f64>,
}

/// One or more y columns sharing an x axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x: Vec<f64>,
    pub columns: Vec<Column>,
}

impl Series {
    pub fn new(title: &str, x_label: &str, y_label: &str, x: Vec<f64>) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            x,
            columns: Vec::new(),
        }
    }

    /// Appends a column; it must have one value per x value.
    pub fn with_column(mut self, label: &str, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), self.x.len());
        self.columns.push(Column {
            label: label.to_string(),
            values,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn column(&self, label: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.label == label)
    }
}

/// A labelled two-dimensional table, such as an overlap or correlation map.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub title: String,
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn shape(&self) -> (usize, usize) {
        (self.row_labels.len(), self.col_labels.len())
    }
}

/// `1.0, 2.0, ..., n` for 1-based axis positions.
pub(crate) fn one_based(n: usize) -> Vec<f64> {
    (1..=n).map(|i| i as f64).collect()
}
