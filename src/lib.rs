//! A crate to decode the `Cookie` header of incoming HTTP requests.
//!
//! # Overview
//!
//! You can use `crumble` as the cookie-parsing stage of a request pipeline.
//!
//! It has support for:
//!
//! - Decoding the `Cookie` header into a plain name → value mapping, via [`Parser`]
//! - Verifying signed (`s:`) and decrypting encrypted (`e:`) cookie values
//! - Rotating secrets: old cookies stay verifiable while new ones are issued
//!   under a newer secret
//! - Inflating `j:` JSON envelopes back into structured data
//!
//! Every request ends up with two mappings, exposed through
//! [`RequestCookies`]: the plain cookies and the verified/decrypted ones.
//! A cookie that carries an `s:`/`e:` tag is moved to the verified mapping
//! whether or not it verified; a failure is reported as
//! [`SignedValue::Failed`] rather than an error, and a tampered signature is
//! indistinguishable from a failed decryption.
//!
//! # Non-goals
//!
//! `crumble` does not build `Set-Cookie` headers for outgoing responses, and
//! it does not manage secret storage or decide when to rotate.
//!
//! # Quickstart
//!
//! ```rust
//! use crumble::{Parser, ParserConfig, Secret, SignedValue, Value};
//!
//! // Start by creating a `Parser` from a `ParserConfig`.
//! // It holds the ordered list of candidate secrets: the first one signs
//! // new values, the rest keep older cookies verifiable during rotation.
//! let mut config = ParserConfig::default();
//! config.secrets.push(Secret::new("keyboard cat"));
//! let parser: Parser = config.into();
//!
//! // Sign a value the way a previous response would have.
//! let signed = parser.sign_value("foobarbaz").unwrap();
//!
//! // You can then use `Parser::parse` on the `Cookie` header you received
//! // from the client.
//! let header = format!("session={signed}; theme=dark");
//! let cookies = parser.parse(Some(&header)).unwrap();
//!
//! // Untagged cookies stay in the plain mapping...
//! assert_eq!(cookies.get("theme"), Some(&Value::from("dark")));
//! // ...while the signed cookie was verified and moved out of it.
//! assert_eq!(cookies.get("session"), None);
//! assert_eq!(
//!     cookies.get_signed("session"),
//!     Some(&SignedValue::Valid(Value::from("foobarbaz"))),
//! );
//! ```
//!
//! # Credits
//!
//! The value-tagging conventions (`s:`, `e:`, `j:`) follow the ones
//! established by Express's `cookie-parser` middleware.
//!
//! [`Parser`]: crate::Parser
//! [`RequestCookies`]: crate::RequestCookies
//! [`SignedValue::Failed`]: crate::SignedValue::Failed

mod crypto;
mod header;
mod parser;
mod secret;
mod value;

pub mod envelope;
pub mod verify;

pub use parser::{Parser, ParserConfig, RequestContext, RequestCookies};
pub use secret::{Secret, SecretEncoding};
pub use value::{SignedValue, Value};
pub use verify::Resolution;

/// Errors that can occur when using `crumble`.
pub mod errors {
    pub use crate::header::DecodingError;
    pub use crate::parser::ParseError;
    pub use crate::secret::EmptySecretError;
}
