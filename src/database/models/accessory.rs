use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::repository::Entity;
use crate::filter::{FilterColumns, FilterKey};
use crate::validation::{normalize_image, FieldErrors};

text_enum! {
    AccessoryMake {
        Generic => "Generic",
        Oem => "OEM",
        Aftermarket => "Aftermarket",
        Custom => "Custom",
    }
}

text_enum! {
    StockStatus {
        InStock => "In Stock",
        LowStock => "Low Stock",
        OutOfStock => "Out of Stock",
        Available => "Available",
    }
}

text_enum! {
    AccessoryColor {
        Black => "Black",
        White => "White",
        Silver => "Silver",
        Chrome => "Chrome",
        Custom => "Custom",
    }
}

impl StockStatus {
    /// At or below this many units an item counts as low stock
    pub const LOW_STOCK_THRESHOLD: i32 = 5;

    /// Conventional status for a quantity. Only used when a client omits
    /// the status on create.
    pub fn from_quantity(quantity: i32) -> Self {
        if quantity <= 0 {
            StockStatus::OutOfStock
        } else if quantity <= Self::LOW_STOCK_THRESHOLD {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Accessory {
    pub id: i64,
    pub name: String,
    pub make: String,
    pub quantity: i32,
    /// PHP
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
pub struct NewAccessory {
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
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl NewAccessory {
    fn resolved_status(&self) -> String {
        match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(status) => status.to_string(),
            None => StockStatus::from_quantity(self.quantity).as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccessory {
    pub name: Option<String>,
    pub make: Option<String>,
    pub quantity: Option<i32>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub status: Option<String>,
    pub color: Option<String>,
    /// Blank string clears the image
    pub image: Option<String>,
}

static COLUMNS: FilterColumns = FilterColumns {
    table: "accessories",
    columns: &[
        (FilterKey::Make, "make"),
        (FilterKey::Status, "status"),
        (FilterKey::UnitColor, "color"),
    ],
    search: Some(("name", "make")),
};

#[async_trait]
impl Entity for Accessory {
    type Create = NewAccessory;
    type Patch = UpdateAccessory;

    const LABEL: &'static str = "Accessory";

    fn columns() -> &'static FilterColumns {
        &COLUMNS
    }

    fn validate_new(input: &NewAccessory) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("name", &input.name);
        errors.require_one_of("make", input.make.trim(), AccessoryMake::LABELS);
        errors.require_one_of("color", input.color.trim(), AccessoryColor::LABELS);
        errors.require_non_negative_quantity("quantity", input.quantity);
        errors.require_price("price", input.price);
        errors.require_one_of("status", &input.resolved_status(), StockStatus::LABELS);
        errors.check_image("image", input.image.as_deref());
        errors.into_result()
    }

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("name", &self.name);
        errors.require_one_of("make", &self.make, AccessoryMake::LABELS);
        errors.require_one_of("color", &self.color, AccessoryColor::LABELS);
        errors.require_non_negative_quantity("quantity", self.quantity);
        errors.require_price("price", self.price);
        errors.require_one_of("status", &self.status, StockStatus::LABELS);
        errors.check_image("image", self.image.as_deref());
        errors.into_result()
    }

    fn merge(&mut self, patch: UpdateAccessory) {
        if let Some(name) = patch.name { self.name = name.trim().to_string(); }
        if let Some(make) = patch.make { self.make = make.trim().to_string(); }
        if let Some(quantity) = patch.quantity { self.quantity = quantity; }
        if let Some(price) = patch.price { self.price = price; }
        if let Some(status) = patch.status { self.status = status.trim().to_string(); }
        if let Some(color) = patch.color { self.color = color.trim().to_string(); }
        if let Some(image) = patch.image { self.image = normalize_image(Some(image)); }
    }

    async fn insert(pool: &PgPool, input: &NewAccessory) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Accessory>(
            "INSERT INTO accessories (name, make, quantity, price, status, color, image)
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
        sqlx::query_as::<_, Accessory>(
            "UPDATE accessories
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
