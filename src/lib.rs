//! Fill Guide - Conversational Template Completion
//!
//! This crate implements a dialog engine that walks a user through the named
//! blanks of a text template, turning free-form replies into validated field
//! values with the help of a language model.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
