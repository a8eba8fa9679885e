//! Extraction Integration Tests
//!
//! Properties of the pure extraction functions over realistic transcripts.

use recipe_scribe::domain::{derive_id, Category, RecipeId};
use recipe_scribe::extract::{
    assemble, derive_creator, extract_ingredients, extract_steps, normalize, MAX_INGREDIENTS,
    MAX_STEPS, TIKTOK_CREATOR, UNKNOWN_CREATOR, YOUTUBE_CREATOR,
};

#[test]
fn test_recipe_id_is_deterministic_and_distinct() {
    let links = [
        "https://youtu.be/a",
        "https://youtu.be/b",
        "https://youtu.be/a?t=1",
        "https://www.tiktok.com/@chef/video/123",
        "",
    ];

    for link in links {
        assert_eq!(derive_id(link), derive_id(link));
        assert_eq!(derive_id(link).as_str().len(), 64);
    }

    let mut ids: Vec<RecipeId> = links.iter().map(|l| derive_id(l)).collect();
    ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    ids.dedup();
    assert_eq!(ids.len(), links.len());
}

#[test]
fn test_normalize_is_idempotent_without_double_spaces() {
    let samples = [
        "  Hello   world  ",
        "Add 2 cups flour!!! 🍞🍞  then\t\twhisk",
        "Mix  ~~ well *** (gently) -- ok",
        "Ceapă și usturoi,  prăjite: 5 minute.",
        "a \u{00a0} b",
        "",
        "   ",
    ];

    for raw in samples {
        let once = normalize(raw);
        assert_eq!(normalize(&once), once, "not idempotent for {:?}", raw);
        assert!(!once.contains("  "), "double space in {:?}", once);
        assert_eq!(once.trim(), once);
        assert!(once.chars().count() <= raw.chars().count());
    }
}

#[test]
fn test_caps_and_source_order() {
    let ingredient_lines: Vec<String> = (1..=30).map(|i| format!("{} g item{}", i, i)).collect();
    let ingredients = extract_ingredients(&ingredient_lines.join("\n"));

    assert_eq!(ingredients.len(), MAX_INGREDIENTS);
    for (i, ingredient) in ingredients.iter().enumerate() {
        assert_eq!(ingredient.name, format!("item{}", i + 1));
        assert_eq!(ingredient.qty, Some((i + 1) as f64));
    }

    let step_lines: Vec<String> = (1..=25)
        .map(|i| format!("Step {}: stir the pot slowly", i))
        .collect();
    let steps = extract_steps(&step_lines.join("\n"));

    assert_eq!(steps.len(), MAX_STEPS);
    for (i, step) in steps.iter().enumerate() {
        assert_eq!(step.index, i as u32 + 1);
        assert_eq!(step.text, step_lines[i]);
    }
}

#[test]
fn test_two_cups_flour() {
    let ingredients = extract_ingredients("2 cups flour");

    assert_eq!(ingredients.len(), 1);
    let json = serde_json::to_value(&ingredients[0]).unwrap();
    assert_eq!(json["name"], "flour");
    assert_eq!(json["qty"], 2.0);
    assert_eq!(json["unit"], "cups");
    assert_eq!(json["category"], "Pantry");
}

#[test]
fn test_step_duration() {
    let steps = extract_steps("Cook the chicken breast for 10 minutes until golden");

    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].duration_sec, Some(600));
    assert_eq!(
        serde_json::to_value(&steps[0]).unwrap()["durationSec"],
        600
    );
}

#[test]
fn test_onion_lines_are_vegetables() {
    for line in ["red onion", "ONIONS, diced", "one Spring Onion"] {
        let ingredients = extract_ingredients(line);
        assert_eq!(ingredients.len(), 1, "{}", line);
        assert_eq!(ingredients[0].category, Category::Vegetables, "{}", line);
        assert_eq!(ingredients[0].qty, None);
    }
}

#[test]
fn test_creator_placeholders() {
    assert_eq!(
        derive_creator("https://www.tiktok.com/@chef/video/123"),
        TIKTOK_CREATOR
    );
    assert_eq!(
        derive_creator("https://www.tiktok.com/@someone-else/video/999?lang=en"),
        TIKTOK_CREATOR
    );
    assert_eq!(
        derive_creator("https://m.youtube.com/shorts/abc"),
        YOUTUBE_CREATOR
    );
    assert_eq!(derive_creator("definitely not a link"), UNKNOWN_CREATOR);
}

#[test]
fn test_multiline_transcript_assembly() {
    let transcript = "\
Weeknight pasta
200 g spaghetti
2 tbsp olive oil
garlic
1. Boil the spaghetti for 9 minutes in salted water
2) Fry the garlic in the oil for 1 minute
Finally toss everything together and serve hot";

    let record = assemble(
        derive_id("https://youtu.be/pasta"),
        "https://youtu.be/pasta",
        "en",
        transcript,
    );

    assert_eq!(record.title.as_deref(), Some("Weeknight pasta"));

    let names: Vec<&str> = record.ingredients.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names[..4], ["Weeknight pasta", "spaghetti", "olive oil", "garlic"]);
    assert_eq!(record.ingredients[2].category, Category::CondimentsAndOils);

    assert_eq!(record.steps.len(), 3);
    assert_eq!(record.steps[0].duration_sec, Some(540));
    assert_eq!(record.steps[1].duration_sec, Some(60));
    assert_eq!(record.steps[2].index, 3);
}
