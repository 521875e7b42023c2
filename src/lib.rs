//! # Breed Scout
//!
//! Scrape dog-breed pages into a local JSON corpus and answer "which breed
//! suits me?" questions with keyword retrieval and a hosted language model.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────┐
//! │ Fetcher      │──▶│  Extractor  │──▶│  JSON store  │
//! │ + RateLimit  │   │ links+body  │   │ breeds.json  │
//! └──────────────┘   └─────────────┘   └──────┬───────┘
//!                                             │ (or built-in breeds)
//!                                             ▼
//!                    ┌─────────────┐   ┌──────────────┐
//!                    │  Assistant  │◀──│  Retriever   │
//!                    │  (LLM call) │   │    BM25      │
//!                    └─────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! scout scrape                          # listing → breed pages → JSON
//! scout search "low shedding, good with kids"
//! OPENAI_API_KEY=sk-... scout ask "small dog for a flat?"
//! scout status
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Breed documents and scrape reports |
//! | [`fetch`] | HTTP page fetching |
//! | [`rate_limit`] | Minimum spacing between requests |
//! | [`extract`] | Link and body extraction strategies |
//! | [`scrape`] | The scrape pipeline and `scout scrape` |
//! | [`store`] | Atomic JSON persistence |
//! | [`fallback`] | Built-in breed list |
//! | [`search`] | BM25 retriever and `scout search` |
//! | [`assistant`] | Prompt building and LLM providers |
//! | [`progress`] | Scrape progress on stderr |
//! | [`status`] | `scout status` |

pub mod assistant;
pub mod config;
pub mod extract;
pub mod fallback;
pub mod fetch;
pub mod models;
pub mod progress;
pub mod rate_limit;
pub mod scrape;
pub mod search;
pub mod status;
pub mod store;
