//! Service types customers can request a ticket for.

use serde::{Deserialize, Serialize};

/// A category of service with its own ticket code prefix and display color.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceType {
    pub id: String,
    pub name: String,
    /// Ticket code prefix, e.g. `"CAJ"`.
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Display color as `#RRGGBB`.
    pub color: String,
    pub estimated_duration_minutes: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl ServiceType {
    pub fn new(id: impl Into<String>, name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            code: code.into(),
            description: None,
            color: "#3B82F6".to_string(),
            estimated_duration_minutes: 10,
            active: true,
        }
    }
}

/// Service types offered when issuing new tickets, ordered by name.
pub fn active_service_types(service_types: &[ServiceType]) -> Vec<ServiceType> {
    let mut active: Vec<ServiceType> = service_types.iter().filter(|s| s.active).cloned().collect();
    active.sort_by(|a, b| a.name.cmp(&b.name));
    active
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_service_types_filters_and_sorts() {
        let mut retired = ServiceType::new("s3", "Archivo", "ARC");
        retired.active = false;
        let list = vec![
            ServiceType::new("s1", "Pagos", "PAG"),
            retired,
            ServiceType::new("s2", "Consultas", "CON"),
        ];
        let names: Vec<_> = active_service_types(&list).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Consultas", "Pagos"]);
    }
}
