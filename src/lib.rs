//! # jobfit
//!
//! A resume / job-description retrieval and gap-analysis engine for AI
//! assistants.
//!
//! jobfit ingests a candidate's resume and a job description, cuts both into
//! section-labeled chunks, and serves grounded context to an LLM through a
//! hybrid retrieval pipeline (BM25 + vector similarity + cross-encoder
//! reranking). On top of retrieval it computes a skill-gap report and powers
//! a context-grounded chat, via both a CLI and a JSON HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌────────────────┐
//! │ Resume + JD  │──▶│   Ingestion    │──▶│    Session      │
//! │  (raw text)  │   │ clean/split/  │   │ store + vector │
//! └──────────────┘   │ chunk/embed   │   │ index per doc  │
//!                    └───────────────┘   └───────┬────────┘
//!                                                │
//!                        ┌───────────────────────┤
//!                        ▼                       ▼
//!                  ┌───────────┐           ┌───────────┐
//!                  │ Gap       │           │ Chat      │
//!                  │ analysis  │           │ retrieval │
//!                  └─────┬─────┘           └─────┬─────┘
//!                        └──────── hybrid ───────┘
//!                                  search
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! jobfit analyze --resume resume.txt --jd jd.txt
//! jobfit search "kubernetes" --resume resume.txt --jd jd.txt --section skills
//! jobfit serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`sections`] | Cleaning and section splitting |
//! | [`chunk`] | Character-window chunking |
//! | [`store`] | In-memory per-session document store |
//! | [`lexical`] | BM25 lexical ranking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`vector`] | In-memory vector index |
//! | [`rerank`] | Cross-encoder reranking |
//! | [`search`] | Hybrid search façade |
//! | [`ingest`] | Session building |
//! | [`similarity`] | Whole-document similarity |
//! | [`analysis`] | Skill-gap analysis |
//! | [`intent`] | Chat query intent detection |
//! | [`chat`] | Context-grounded chat turns |
//! | [`llm`] | Chat-completion provider |
//! | [`server`] | JSON HTTP API |

pub mod analysis;
pub mod chat;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod ingest;
pub mod intent;
pub mod lexical;
pub mod llm;
pub mod models;
pub mod rerank;
pub mod search;
pub mod sections;
pub mod server;
pub mod similarity;
pub mod store;
pub mod vector;
