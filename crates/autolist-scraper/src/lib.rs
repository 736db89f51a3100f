pub mod classify;
pub mod client;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod types;

pub use classify::classify;
pub use client::AutotraderClient;
pub use envelope::{split_envelope, Envelope};
pub use error::{ExtractionError, NormalizationError, ScraperError};
pub use extract::{extract_embedded_payload, EmbeddedPayload};
pub use normalize::{absolutize_url, normalize_listing, RecordShape};
pub use types::{Channel, RawFragment, RawResponse, SearchQuery};
