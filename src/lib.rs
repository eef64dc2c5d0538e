//! # Chestnut
//!
//! A local-first note ingestion, summarization, and question-answering tool.
//!
//! Chestnut imports plain-text files into SQLite, asks a locally hosted
//! language model (Ollama) to summarize each note, and answers free-text
//! questions by selecting the most relevant notes and sending their full
//! contents as context to the model.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────┐
//! │  Import  │──▶│  SQLite   │◀──│ Summarize │──▶ Ollama
//! │ (folder) │   │  (notes)  │   └──────────┘
//! └──────────┘   └────┬──────┘
//!                     │ summaries
//!                     ▼
//!               ┌──────────┐   ┌──────────┐
//!               │ Selector │──▶│ Composer │──▶ Ollama
//!               └──────────┘   └────┬─────┘
//!                                   ▼
//!                          CLI  /  HTTP
//! ```
//!
//! ## Quick start
//!
//! ```bash
//! chestnut init                 # create database
//! chestnut import ./notes      # import text files
//! chestnut summarize           # summarize pending notes
//! chestnut ask "what did I write about cats?"
//! chestnut serve               # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Typed note records |
//! | [`store`] | Store operations over the notes table |
//! | [`import`] | Folder import |
//! | [`llm`] | Language-model client |
//! | [`summarize`] | Batch and single-note summarization |
//! | [`selector`] | Relevance selection (lexical overlap) |
//! | [`ask`] | Answer composition |
//! | [`server`] | HTTP server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod ask;
pub mod config;
pub mod db;
pub mod import;
pub mod list;
pub mod llm;
pub mod migrate;
pub mod models;
pub mod selector;
pub mod server;
pub mod store;
pub mod summarize;
