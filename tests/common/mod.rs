//! Synthetic scenes and a small knowledge base shared by the integration tests.
#![allow(dead_code)]

use faunasense::ClassificationEngine;
use faunasense::knowledge::SharedKnowledge;
use faunasense::schema::{BoundingBox, KnowledgeEntry};
use image::{Rgb, RgbImage};
use std::sync::Arc;

pub const LIGHT_BLUE: Rgb<u8> = Rgb([173, 216, 230]);
pub const GREY: Rgb<u8> = Rgb([128, 128, 128]);
pub const DARK_GREEN: Rgb<u8> = Rgb([0, 100, 0]);
pub const ORANGE: Rgb<u8> = Rgb([255, 140, 0]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const GOLDEN: Rgb<u8> = Rgb([200, 160, 80]);

fn fill(image: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    for py in y..y + height {
        for px in x..x + width {
            image.put_pixel(px, py, color);
        }
    }
}

/// Long grey body on open water.
pub fn whale_scene() -> RgbImage {
    let mut image = RgbImage::from_pixel(800, 300, LIGHT_BLUE);
    fill(&mut image, 100, 100, 600, 100, GREY);
    image
}

/// Wide, flat forest scene.
pub fn forest_scene() -> RgbImage {
    RgbImage::from_pixel(700, 350, DARK_GREEN)
}

/// Region of [`leopard_scene`] covering the animal.
pub fn leopard_body() -> BoundingBox {
    BoundingBox::new(150.0, 140.0, 300.0, 120.0)
}

/// Orange body with a grid of black spots in a forest.
pub fn leopard_scene() -> RgbImage {
    let mut image = RgbImage::from_pixel(600, 400, DARK_GREEN);
    fill(&mut image, 150, 140, 300, 120, ORANGE);
    for row in 0..3 {
        for col in 0..7 {
            fill(&mut image, 160 + 40 * col, 150 + 40 * row, 15, 15, BLACK);
        }
    }
    image
}

/// Vertical orange and black stripes.
pub fn stripe_scene() -> RgbImage {
    RgbImage::from_fn(200, 200, |x, _| {
        if (x / 10) % 2 == 0 { ORANGE } else { BLACK }
    })
}

pub fn savanna_scene() -> RgbImage {
    RgbImage::from_pixel(400, 300, GOLDEN)
}

pub fn grey_scene() -> RgbImage {
    RgbImage::from_pixel(64, 64, GREY)
}

pub fn knowledge_entries() -> Vec<KnowledgeEntry> {
    vec![
        KnowledgeEntry::new("HUMPBACK WHALE")
            .with_aliases(["whale", "humpback"])
            .with_species("Megaptera novaeangliae")
            .with_category("Mammalia"),
        KnowledgeEntry::new("GRAY WOLF")
            .with_aliases(["wolf", "grey wolf", "timber wolf"])
            .with_species("Canis lupus"),
        KnowledgeEntry::new("WESTERN DOMESTIC DOG")
            .with_aliases(["dog", "domestic dog"])
            .with_species("Canis familiaris"),
        KnowledgeEntry::new("LEOPARD")
            .with_species("Panthera pardus")
            .with_category("Mammals"),
        KnowledgeEntry::new("AFRICAN LION")
            .with_aliases(["lion"])
            .with_species("Panthera leo"),
        KnowledgeEntry::new("BENGAL TIGER")
            .with_aliases(["tiger"])
            .with_species("Panthera tigris tigris"),
    ]
}

pub fn engine() -> ClassificationEngine {
    let knowledge = SharedKnowledge::from_entries(knowledge_entries()).unwrap();
    ClassificationEngine::new(Arc::new(knowledge))
}

pub const KNOWLEDGE_TOML: &str = r#"
[[entries]]
canonical_name = "HUMPBACK WHALE"
aliases = ["whale", "humpback"]
species = "Megaptera novaeangliae"
category = "Mammalia"

[[entries]]
canonical_name = "GRAY WOLF"
aliases = ["wolf", "grey wolf"]

[[entries]]
canonical_name = "WESTERN DOMESTIC DOG"
aliases = ["dog"]
"#;
