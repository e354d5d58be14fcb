//! Static haircut recommendations per face shape.

use crate::shape::ShapeCategory;

/// Shown when the category has no recommendation block.
pub const FALLBACK: &str = "No hay recomendaciones disponibles.";

const OVAL: &str = "• Casi todos los estilos te quedan bien.\n\
                    • Bob largo o corto.\n\
                    • Flequillos rectos o de lado.\n\
                    • Pelo largo con capas.";

const SQUARE: &str = "• Cortes con capas suaves para redondear ángulos.\n\
                      • Pelo largo y ondulado.\n\
                      • Flequillos de lado.\n\
                      • Evita los cortes rectos a la altura de la mandíbula.";

const ROUND: &str = "• Cortes que añadan altura y volumen en la parte superior.\n\
                     • Estilo Pixie con volumen arriba.\n\
                     • Pelo largo y liso.\n\
                     • Evita los bobs cortos y flequillos rectos.";

/// Recommendation block for a shape category.
pub fn recommend(category: ShapeCategory) -> &'static str {
    match category {
        ShapeCategory::Oval => OVAL,
        ShapeCategory::Square => SQUARE,
        ShapeCategory::Round => ROUND,
        ShapeCategory::Unknown => FALLBACK,
    }
}

/// Recommendation block for a display label such as `"Ovalado"`.
///
/// Any label outside the defined categories gets [`FALLBACK`].
pub fn recommend_for_label(label: &str) -> &'static str {
    ShapeCategory::from_label(label)
        .map(recommend)
        .unwrap_or(FALLBACK)
}
