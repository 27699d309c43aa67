use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use super::accessory::StockStatus;
use crate::database::repository::Entity;
use crate::filter::{FilterColumns, FilterKey};
use crate::validation::{normalize_image, FieldErrors};

/// Raw building material (lumber, sheet metal, paint) with a free-text status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub supplier: String,
    pub quantity: i32,
    pub status: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMaterial {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl NewMaterial {
    fn resolved_status(&self) -> String {
        match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(status) => status.to_string(),
            None => StockStatus::from_quantity(self.quantity).as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMaterial {
    pub name: Option<String>,
    pub category: Option<String>,
    pub supplier: Option<String>,
    pub quantity: Option<i32>,
    pub status: Option<String>,
    pub image: Option<String>,
}

static COLUMNS: FilterColumns = FilterColumns {
    table: "materials",
    columns: &[
        (FilterKey::Status, "status"),
        (FilterKey::Category, "category"),
        (FilterKey::Supplier, "supplier"),
    ],
    search: Some(("name", "category")),
};

#[async_trait]
impl Entity for Material {
    type Create = NewMaterial;
    type Patch = UpdateMaterial;

    const LABEL: &'static str = "Material";

    fn columns() -> &'static FilterColumns {
        &COLUMNS
    }

    fn validate_new(input: &NewMaterial) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("name", &input.name);
        errors.require_text("category", &input.category);
        errors.require_text("supplier", &input.supplier);
        errors.require_non_negative_quantity("quantity", input.quantity);
        errors.check_image("image", input.image.as_deref());
        errors.into_result()
    }

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("name", &self.name);
        errors.require_text("category", &self.category);
        errors.require_text("supplier", &self.supplier);
        errors.require_text("status", &self.status);
        errors.require_non_negative_quantity("quantity", self.quantity);
        errors.check_image("image", self.image.as_deref());
        errors.into_result()
    }

    fn merge(&mut self, patch: UpdateMaterial) {
        if let Some(name) = patch.name { self.name = name.trim().to_string(); }
        if let Some(category) = patch.category { self.category = category.trim().to_string(); }
        if let Some(supplier) = patch.supplier { self.supplier = supplier.trim().to_string(); }
        if let Some(quantity) = patch.quantity { self.quantity = quantity; }
        if let Some(status) = patch.status { self.status = status.trim().to_string(); }
        if let Some(image) = patch.image { self.image = normalize_image(Some(image)); }
    }

    async fn insert(pool: &PgPool, input: &NewMaterial) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Material>(
            "INSERT INTO materials (name, category, supplier, quantity, status, image)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(input.name.trim())
        .bind(input.category.trim())
        .bind(input.supplier.trim())
        .bind(input.quantity)
        .bind(input.resolved_status())
        .bind(normalize_image(input.image.clone()))
        .fetch_one(pool)
        .await
    }

    async fn write(pool: &PgPool, id: i64, record: &Self) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Material>(
            "UPDATE materials
             SET name = $2, category = $3, supplier = $4, quantity = $5, status = $6, image = $7,
                 updated_at = GREATEST(NOW(), created_at)
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&record.name)
        .bind(&record.category)
        .bind(&record.supplier)
        .bind(record.quantity)
        .bind(&record.status)
        .bind(&record.image)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plywood() -> NewMaterial {
        serde_json::from_value(serde_json::json!({
            "name": "Plywood",
            "category": "Lumber",
            "supplier": "Wood Works",
            "quantity": 10,
            "status": "In Stock"
        }))
        .unwrap()
    }

    #[test]
    fn plywood_is_valid() {
        let input = plywood();
        assert!(Material::validate_new(&input).is_ok());
        assert_eq!(input.resolved_status(), "In Stock");
    }

    #[test]
    fn missing_supplier_is_reported() {
        let mut input = plywood();
        input.supplier = " ".to_string();
        input.quantity = -3;
        let errors = Material::validate_new(&input).unwrap_err();
        assert!(errors.contains("supplier"));
        assert!(errors.contains("quantity"));
        assert!(!errors.contains("name"));
    }

    #[test]
    fn quantity_only_patch_keeps_the_rest() {
        let now = Utc::now();
        let original = Material {
            id: 1,
            name: "Plywood".to_string(),
            category: "Lumber".to_string(),
            supplier: "Wood Works".to_string(),
            quantity: 10,
            status: "In Stock".to_string(),
            image: None,
            created_at: now,
            updated_at: now,
        };
        let mut merged = original.clone();
        merged.merge(UpdateMaterial { quantity: Some(0), ..Default::default() });
        assert_eq!(merged.quantity, 0);
        assert_eq!(merged.name, original.name);
        assert_eq!(merged.status, original.status);
        assert!(merged.validate().is_ok());
    }
}
