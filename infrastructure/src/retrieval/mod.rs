//! Retrieval adapters implementing [`RetrievalPort`](agora_application::RetrievalPort)
//!
//! | Backend | Adapter | Source |
//! |---------|---------|--------|
//! | `web` | [`WebSearchRetrieval`] | DuckDuckGo Instant Answer API |
//! | `corpus` | [`CorpusRetrieval`] | pre-chunked JSON file |
//! | `none` | [`NoRetrieval`](agora_application::NoRetrieval) | nothing |

mod corpus;
mod web_search;

pub use corpus::{CorpusChunk, CorpusError, CorpusRetrieval};
pub use web_search::WebSearchRetrieval;
