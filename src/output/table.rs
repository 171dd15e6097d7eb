//! Table output formatting

use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Rows},
};

/// Format data as a table
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    if data.is_empty() {
        return "No results found.".to_string();
    }

    let mut table = Table::new(data);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fixtures::ProjectBuilder;
    use crate::models::ProjectDisplay;

    #[test]
    fn test_format_table_empty() {
        let items: Vec<ProjectDisplay> = vec![];
        assert_eq!(format_table(&items), "No results found.");
    }

    #[test]
    fn test_format_table_project_rows() {
        let projects = [
            ProjectBuilder::new("p1", "org-1").name("web").build(),
            ProjectBuilder::new("p2", "org-1").name("api").build(),
        ];
        let rows: Vec<ProjectDisplay> = projects.iter().map(ProjectDisplay::from).collect();

        let result = format_table(&rows);

        assert!(result.contains("PROJECT ID"));
        assert!(result.contains("web"));
        assert!(result.contains("api"));
        // Rounded style uses ╭ for top-left corner
        assert!(result.contains("╭"));
        assert!(result.contains("╰"));
    }
}
