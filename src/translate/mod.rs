// Translation pipeline
//
// - handler: the provider capability the pipeline is written against
// - translator: cue-by-cue translation of a SubtitleFile with quota admission
// - deepl: DeepL REST implementation of the handler

pub mod deepl;
pub mod handler;
pub mod translator;

pub use deepl::DeeplHandler;
pub use handler::TranslationHandler;
pub use translator::{ProgressFn, SrtTranslator};
