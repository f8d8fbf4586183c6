//! Production collaborators backed by external HTTP APIs.

mod gemini;
mod open_meteo;
mod supabase;

pub use gemini::{GeminiClient, GEMINI_BASE_URL};
pub use open_meteo::{OpenMeteoSource, AIR_QUALITY_URL, NOMINATIM_URL};
pub use supabase::{allergies_from_profile, SupabaseStore};
