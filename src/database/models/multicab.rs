use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use super::accessory::StockStatus;
use crate::database::repository::Entity;
use crate::filter::{FilterColumns, FilterKey};
use crate::validation::{normalize_image, FieldErrors};

/// A multicab unit for sale. Same shape as an accessory, but make, color and
/// status are free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MultiCab {
    pub id: i64,
    pub name: String,
    pub make: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub status: String,
    pub color: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMultiCab {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "unitColor")]
    pub color: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl NewMultiCab {
    fn resolved_status(&self) -> String {
        match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(status) => status.to_string(),
            None => StockStatus::from_quantity(self.quantity).as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMultiCab {
    pub name: Option<String>,
    pub make: Option<String>,
    pub quantity: Option<i32>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub status: Option<String>,
    #[serde(alias = "unitColor")]
    pub color: Option<String>,
    pub image: Option<String>,
}

static COLUMNS: FilterColumns = FilterColumns {
    table: "multicabs",
    columns: &[
        (FilterKey::Make, "make"),
        (FilterKey::Status, "status"),
        (FilterKey::UnitColor, "color"),
    ],
    search: Some(("name", "make")),
};

#[async_trait]
impl Entity for MultiCab {
    type Create = NewMultiCab;
    type Patch = UpdateMultiCab;

    const LABEL: &'static str = "Multicab";

    fn columns() -> &'static FilterColumns {
        &COLUMNS
    }

    fn validate_new(input: &NewMultiCab) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("name", &input.name);
        errors.require_text("make", &input.make);
        errors.require_text("color", &input.color);
        errors.require_non_negative_quantity("quantity", input.quantity);
        errors.require_price("price", input.price);
        errors.check_image("image", input.image.as_deref());
        errors.into_result()
    }

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("name", &self.name);
        errors.require_text("make", &self.make);
        errors.require_text("color", &self.color);
        errors.require_text("status", &self.status);
        errors.require_non_negative_quantity("quantity", self.quantity);
        errors.require_price("price", self.price);
        errors.check_image("image", self.image.as_deref());
        errors.into_result()
    }

    fn merge(&mut self, patch: UpdateMultiCab) {
        if let Some(name) = patch.name { self.name = name.trim().to_string(); }
        if let Some(make) = patch.make { self.make = make.trim().to_string(); }
        if let Some(quantity) = patch.quantity { self.quantity = quantity; }
        if let Some(price) = patch.price { self.price = price; }
        if let Some(status) = patch.status { self.status = status.trim().to_string(); }
        if let Some(color) = patch.color { self.color = color.trim().to_string(); }
        if let Some(image) = patch.image { self.image = normalize_image(Some(image)); }
    }

    async fn insert(pool: &PgPool, input: &NewMultiCab) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, MultiCab>(
            "INSERT INTO multicabs (name, make, quantity, price, status, color, image)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(input.name.trim())
        .bind(input.make.trim())
        .bind(input.quantity)
        .bind(input.price)
        .bind(input.resolved_status())
        .bind(input.color.trim())
        .bind(normalize_image(input.image.clone()))
        .fetch_one(pool)
        .await
    }

    async fn write(pool: &PgPool, id: i64, record: &Self) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, MultiCab>(
            "UPDATE multicabs
             SET name = $2, make = $3, quantity = $4, price = $5, status = $6, color = $7, image = $8,
                 updated_at = GREATEST(NOW(), created_at)
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&record.name)
        .bind(&record.make)
        .bind(record.quantity)
        .bind(record.price)
        .bind(&record.status)
        .bind(&record.color)
        .bind(&record.image)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_text_make_and_color_are_accepted() {
        let input: NewMultiCab = serde_json::from_value(serde_json::json!({
            "name": "Suzuki Every Wagon",
            "make": "Suzuki",
            "unitColor": "Pearl White",
            "quantity": 2,
            "price": 185000
        }))
        .unwrap();
        assert!(MultiCab::validate_new(&input).is_ok());
        assert_eq!(input.color, "Pearl White");
        assert_eq!(input.resolved_status(), "Low Stock");
    }

    #[test]
    fn blank_make_is_rejected() {
        let input = NewMultiCab {
            name: "Scrum".to_string(),
            color: "Red".to_string(),
            ..Default::default()
        };
        let errors = MultiCab::validate_new(&input).unwrap_err();
        assert!(errors.contains("make"));
        assert!(!errors.contains("price"));
    }

    #[test]
    fn merged_record_is_revalidated() {
        let now = Utc::now();
        let mut cab = MultiCab {
            id: 3,
            name: "Carry".to_string(),
            make: "Suzuki".to_string(),
            quantity: 1,
            price: Decimal::from(95000),
            status: "Available".to_string(),
            color: "Blue".to_string(),
            image: None,
            created_at: now,
            updated_at: now,
        };
        cab.merge(UpdateMultiCab { make: Some("  ".to_string()), ..Default::default() });
        assert!(cab.validate().unwrap_err().contains("make"));
    }
}
