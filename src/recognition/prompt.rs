//! Prompt construction for vision models

const BASE_PROMPT: &str = r#"You are a highly accurate food recognition AI. Analyze this image and identify the food.

Requirements:
1. Return ONLY the standard English food name (e.g. "apple", "beef", "rice", "chicken")
2. Use common, simple English names that match a food database
3. If several foods are present, identify the MAIN food item
4. Be specific: avoid generic terms like "fruit" or "vegetable"
5. For prepared foods, name the main ingredient ("chicken" for a chicken sandwich)

Respond with a single JSON object:
{
    "food_name": "standard_english_name",
    "category": "meat/seafood/dairy/fruit/vegetable/grain",
    "confidence": 0.95,
    "description": "brief description",
    "estimated_weight": 150.0,
    "ingredients": ["ingredient1", "ingredient2"]
}"#;

const CLOSING_INSTRUCTIONS: &str = r#"

Special instructions:
- Confidence should realistically reflect recognition accuracy
- Weight estimates are in grams and should consider food density and volume"#;

/// Build the recognition prompt, with optional weight and context hints
pub fn build_prompt(known_weight_grams: Option<f64>, context: Option<&str>) -> String {
    let mut prompt = String::from(BASE_PROMPT);

    if let Some(weight) = known_weight_grams {
        prompt.push_str(&format!(
            "\n\nKnown weight: {:.1}g, take this into account.",
            weight
        ));
    }

    if let Some(ctx) = context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str(&format!("\n\nContext: {}", ctx));
    }

    prompt.push_str(CLOSING_INSTRUCTIONS);
    prompt
}
