//! # sitevisit-id
//!
//! Customer identifiers for site-visit records: parsing, validation, and the
//! sequencer that issues the next identifier after the last one.
//!
//! ## Identifier Format
//!
//! `{prefix}-{block}{letter}{counter}`, for example `A-000a01`:
//!
//! | Segment   | Shape              | Range          |
//! |-----------|--------------------|----------------|
//! | `prefix`  | 1-3 letters `A-Z`  | `A` .. `ZZZ`   |
//! | `block`   | 3 digits           | `000` .. `999` |
//! | `letter`  | 1 letter `a-z`     | `a` .. `z`     |
//! | `counter` | 2 digits           | `01` .. `99`   |
//!
//! The segments form a mixed-radix counter with the prefix most significant:
//!
//! ```
//! use sitevisit_id::{next_customer_id, validate_customer_id};
//!
//! assert_eq!(next_customer_id(None)?.to_string(), "A-000a01");
//! assert_eq!(next_customer_id(Some("A-000a99"))?.to_string(), "A-000b01");
//! assert_eq!(next_customer_id(Some("Z-999z99"))?.to_string(), "AA-000a01");
//! assert!(validate_customer_id("QR-123m45"));
//! assert!(!validate_customer_id("a-000A01"));
//! # Ok::<(), sitevisit_id::IdError>(())
//! ```
//!
//! The sequencer holds no state. Callers own the last issued identifier and
//! are responsible for uniqueness when several writers issue concurrently.

mod customer;
mod error;
pub mod segments;

pub use customer::{next_customer_id, validate_customer_id, CustomerId, Rollover};
pub use error::IdError;
