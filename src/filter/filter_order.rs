use super::types::FilterOrderInfo;

pub struct FilterOrder;

impl FilterOrder {
    /// Newest first; `id` breaks ties between rows created in the same instant
    pub fn newest_first() -> Vec<FilterOrderInfo> {
        vec![
            FilterOrderInfo { column: "created_at" },
            FilterOrderInfo { column: "id" },
        ]
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() { return String::new(); }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" DESC", i.column))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}
