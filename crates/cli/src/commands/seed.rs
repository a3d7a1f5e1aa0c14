//! Seed the catalog with demo products.
//!
//! Intended for local development and demos. Refuses to run against a
//! non-empty catalog so it can never duplicate products in a live store.

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;

use protech_api::db::ProductRepository;
use protech_api::models::ProductDraft;

use super::CliError;

/// Insert the demo catalog.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the catalog already
/// has products.
pub async fn run() -> Result<(), CliError> {
    let database_url = super::database_url()?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    let repo = ProductRepository::new(&pool);
    let existing = repo.count().await?;
    if existing > 0 {
        tracing::warn!(
            "Catalog already has {} products, refusing to seed. Empty the products table first.",
            existing
        );
        return Ok(());
    }

    let catalog = demo_catalog();
    let total = catalog.len();
    for draft in &catalog {
        let product = repo.create(draft).await?;
        tracing::info!("Seeded {} ({})", product.name, product.id);
    }

    tracing::info!("Seeding complete: {} products", total);
    Ok(())
}

fn product(
    name: &str,
    brand: &str,
    category: &str,
    description: &str,
    price: Decimal,
    stock: i32,
    image: &str,
) -> ProductDraft {
    ProductDraft {
        name: name.to_owned(),
        brand: brand.to_owned(),
        category: category.to_owned(),
        description: description.to_owned(),
        price,
        stock,
        images: vec![image.to_owned()],
    }
}

fn demo_catalog() -> Vec<ProductDraft> {
    vec![
        product(
            "iPhone 16 Pro 128GB",
            "APPLE",
            "Smartphones",
            "The latest iPhone with A18 Pro chip, advanced camera system with 48MP main sensor, and ProMotion display with 120Hz refresh rate.",
            Decimal::from(1130),
            45,
            "https://images.unsplash.com/photo-1678685888221-cda773a3dcdb?w=500",
        ),
        product(
            "Samsung Galaxy S24 Ultra",
            "SAMSUNG",
            "Smartphones",
            "Flagship Android phone with S Pen, 200MP camera, and powerful Snapdragon 8 Gen 3 processor.",
            Decimal::from(1199),
            32,
            "https://images.unsplash.com/photo-1610945415295-d9bbf067e59c?w=500",
        ),
        product(
            "Google Pixel 9 Pro",
            "GOOGLE",
            "Smartphones",
            "Pure Android experience with Google Tensor G4 chip and advanced AI photography features.",
            Decimal::from(999),
            28,
            "https://images.unsplash.com/photo-1598327105666-5b89351aff97?w=500",
        ),
        product(
            "MacBook Air M3 13-inch",
            "APPLE",
            "Laptops",
            "Ultra-thin laptop with M3 chip, up to 18 hours of battery life, and a stunning Liquid Retina display.",
            Decimal::from(1299),
            20,
            "https://images.unsplash.com/photo-1517336714731-489689fd1ca8?w=500",
        ),
        product(
            "Dell XPS 15",
            "DELL",
            "Laptops",
            "Premium Windows laptop with InfinityEdge display, Intel Core Ultra 7, and dedicated RTX graphics.",
            Decimal::from(1899),
            15,
            "https://images.unsplash.com/photo-1593642632823-8f785ba67e45?w=500",
        ),
        product(
            "Sony WH-1000XM5",
            "SONY",
            "Audio",
            "Industry-leading noise cancelling headphones with 30-hour battery life and crystal-clear call quality.",
            Decimal::from(399),
            60,
            "https://images.unsplash.com/photo-1618366712010-f4ae9c647dcb?w=500",
        ),
        product(
            "AirPods Pro 2",
            "APPLE",
            "Audio",
            "Active noise cancellation, adaptive transparency, and personalized spatial audio with the H2 chip.",
            Decimal::from(249),
            80,
            "https://images.unsplash.com/photo-1606220945770-b5b6c2c55bf1?w=500",
        ),
        product(
            "iPad Pro 11-inch M4",
            "APPLE",
            "Tablets",
            "The thinnest Apple product ever, with the M4 chip and a breakthrough Ultra Retina XDR display.",
            Decimal::from(999),
            25,
            "https://images.unsplash.com/photo-1544244015-0df4b3ffc6b0?w=500",
        ),
        product(
            "Apple Watch Series 10",
            "APPLE",
            "Wearables",
            "Bigger display, thinner design, and advanced health sensors including sleep apnea detection.",
            Decimal::from(399),
            50,
            "https://images.unsplash.com/photo-1579586337278-3befd40fd17a?w=500",
        ),
        product(
            "PlayStation 5 Slim",
            "SONY",
            "Gaming",
            "Next-gen gaming console with ultra-high-speed SSD, ray tracing, and 4K gaming up to 120fps.",
            Decimal::from(499),
            18,
            "https://images.unsplash.com/photo-1606813907291-d86efa9b94db?w=500",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_catalog_is_well_formed() {
        let catalog = demo_catalog();
        assert!(!catalog.is_empty());
        for draft in &catalog {
            assert!(!draft.name.trim().is_empty());
            assert!(draft.price > Decimal::ZERO);
            assert!(draft.stock > 0);
            assert!(!draft.images.is_empty());
        }
    }
}
