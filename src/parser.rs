use crate::crypto::{cipher, signing};
use crate::header;
use crate::verify::{self, ENCRYPTED_PREFIX, SIGNED_PREFIX};
use crate::{envelope, Secret, SecretEncoding, SignedValue, Value};
use std::collections::HashMap;

pub use crate::header::DecodingError;

/// `ParserConfig` specifies which secrets the server accepts for signed and
/// encrypted cookie values, and how those secrets are turned into cipher
/// key bytes.
///
/// # [`Parser`]
///
/// To action this configuration, convert it into a [`Parser`]:
///
/// ```rust
/// use crumble::{Parser, ParserConfig, Secret};
///
/// let mut config = ParserConfig::default();
/// // You'll use secrets loaded from *somewhere* in production—e.g.
/// // from a file, environment variable, or a secret management service.
/// config.secrets.push(Secret::new("keyboard cat"));
/// let parser: Parser = config.into();
/// ```
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct ParserConfig {
    /// The ordered list of candidate secrets.
    ///
    /// The first secret is the one used to sign and encrypt new values; the
    /// remaining entries are older secrets that incoming cookies may still
    /// carry during a rotation window. Incoming values are verified against
    /// each secret in order, first match wins.
    ///
    /// An empty list disables signed-cookie handling entirely: the verified
    /// mapping is always empty.
    pub secrets: Vec<Secret>,
    /// How secret strings are interpreted as raw key bytes when decrypting
    /// an encrypted cookie value. Defaults to [`SecretEncoding::Utf8`].
    pub secret_encoding: SecretEncoding,
}

impl ParserConfig {
    /// A configuration with a single secret and the default encoding.
    pub fn with_secret(secret: Secret) -> ParserConfig {
        ParserConfig {
            secrets: vec![secret],
            secret_encoding: SecretEncoding::default(),
        }
    }

    /// A configuration with an ordered list of secrets, used verbatim, and
    /// the default encoding.
    pub fn with_secrets(secrets: Vec<Secret>) -> ParserConfig {
        ParserConfig {
            secrets,
            secret_encoding: SecretEncoding::default(),
        }
    }
}

/// Decodes the `Cookie` request header into a plain cookie mapping and a
/// verified/decrypted cookie mapping.
///
/// A `Parser` is created once from a [`ParserConfig`] and reused across
/// requests; it is immutable after construction and safe to share.
///
/// ```rust
/// use crumble::{Parser, ParserConfig, Value};
///
/// let parser: Parser = ParserConfig::default().into();
/// let cookies = parser.parse(Some("foo=bar; theme=j:{\"dark\":true}")).unwrap();
///
/// assert_eq!(cookies.get("foo"), Some(&Value::from("bar")));
/// assert_eq!(
///     cookies.get("theme").unwrap().as_json(),
///     Some(&serde_json::json!({"dark": true})),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Parser {
    secrets: Vec<Secret>,
    secret_encoding: SecretEncoding,
}

impl From<ParserConfig> for Parser {
    fn from(config: ParserConfig) -> Self {
        Parser {
            secrets: config.secrets,
            secret_encoding: config.secret_encoding,
        }
    }
}

impl Parser {
    /// Parses a `Cookie` header into the two per-request cookie mappings.
    ///
    /// An absent or empty header yields two empty mappings. When no secrets
    /// are configured, every value stays in the plain mapping and the
    /// verified mapping is empty. Malformed cookie values never fail the
    /// parse: they degrade to pass-through or [`SignedValue::Failed`].
    pub fn parse(&self, header: Option<&str>) -> Result<RequestCookies, ParseError> {
        let Some(header) = header else {
            return Ok(RequestCookies::default());
        };

        let mut raw = header::parse(header)?;
        let mut signed_cookies = if self.secrets.is_empty() {
            HashMap::new()
        } else {
            verify::extract_verified(&mut raw, &self.secrets, self.secret_encoding)
        };
        envelope::decode_signed_mapping(&mut signed_cookies);

        let mut cookies: HashMap<String, Value> = raw
            .into_iter()
            .map(|(name, value)| (name, Value::Text(value)))
            .collect();
        envelope::decode_mapping(&mut cookies);

        Ok(RequestCookies {
            cookies,
            signed_cookies,
        })
    }

    /// Parses a `Cookie` header and attaches the result to `context`.
    ///
    /// If the context already carries cookie mappings—e.g. an earlier stage
    /// in the pipeline ran this same logic—this is a no-op.
    pub fn populate(
        &self,
        header: Option<&str>,
        context: &mut RequestContext,
    ) -> Result<(), ParseError> {
        if context.cookies.is_some() {
            return Ok(());
        }
        context.cookies = Some(self.parse(header)?);
        Ok(())
    }

    /// Signs `value` with the first configured secret, producing an
    /// `s:`-tagged cookie value that [`Parser::parse`] will verify.
    ///
    /// Returns `None` when no secrets are configured.
    pub fn sign_value(&self, value: &str) -> Option<String> {
        let secret = self.secrets.first()?;
        let payload = signing::sign(value, secret.as_str().as_bytes());
        Some(format!("{SIGNED_PREFIX}{payload}"))
    }

    /// Encrypts and signs `value` with the first configured secret,
    /// producing an `e:`-tagged cookie value that [`Parser::parse`] will
    /// verify and decrypt.
    ///
    /// Returns `None` when no secrets are configured, or when the secret
    /// cannot be decoded under the configured [`SecretEncoding`].
    pub fn encrypt_value(&self, value: &str) -> Option<String> {
        let secret = self.secrets.first()?;
        let key_bytes = self.secret_encoding.secret_bytes(secret).ok()?;
        let blob = cipher::encrypt(value.as_bytes(), &cipher::derive_key(&key_bytes));
        let payload = signing::sign(&blob, secret.as_str().as_bytes());
        Some(format!("{ENCRYPTED_PREFIX}{payload}"))
    }
}

/// The two cookie mappings produced for a request.
///
/// The plain mapping holds every cookie that carried no `s:`/`e:` tag; the
/// signed mapping holds the verification outcome for every cookie that did.
/// The two mappings partition the names found in the header: a tagged cookie
/// is removed from the plain mapping whether or not it verified.
#[derive(Debug, Clone, Default)]
pub struct RequestCookies {
    cookies: HashMap<String, Value>,
    signed_cookies: HashMap<String, SignedValue>,
}

impl RequestCookies {
    /// Looks up a plain cookie by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cookies.get(name)
    }

    /// Looks up a signed or encrypted cookie's verification outcome by name.
    pub fn get_signed(&self, name: &str) -> Option<&SignedValue> {
        self.signed_cookies.get(name)
    }

    /// The plain cookie mapping.
    pub fn cookies(&self) -> &HashMap<String, Value> {
        &self.cookies
    }

    /// The verified/decrypted cookie mapping.
    ///
    /// Empty when no secrets are configured.
    pub fn signed_cookies(&self) -> &HashMap<String, SignedValue> {
        &self.signed_cookies
    }
}

/// Per-request carrier for the parsed cookie mappings.
///
/// Create one per request and pass it through the pipeline explicitly; the
/// mappings are populated once by [`Parser::populate`] and discarded with
/// the request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cookies: Option<RequestCookies>,
}

impl RequestContext {
    /// A fresh, unpopulated context.
    pub fn new() -> RequestContext {
        Default::default()
    }

    /// The parsed cookie mappings, if [`Parser::populate`] has run.
    pub fn cookies(&self) -> Option<&RequestCookies> {
        self.cookies.as_ref()
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
/// The error returned by [`Parser::parse`].
///
/// The verification pipeline itself never fails: tampered or malformed
/// values degrade to [`SignedValue::Failed`] or pass-through. Only the
/// header codec can produce an error.
pub enum ParseError {
    #[error(transparent)]
    Decoding(#[from] DecodingError),
}

#[cfg(test)]
mod tests {
    use crate::{Parser, ParserConfig, RequestContext, Secret, SecretEncoding, SignedValue, Value};

    fn parser(secrets: &[&str]) -> Parser {
        ParserConfig::with_secrets(secrets.iter().map(|s| Secret::new(*s)).collect()).into()
    }

    #[test]
    fn no_secrets_populates_only_the_plain_mapping() {
        let parser: Parser = ParserConfig::default().into();
        let cookies = parser.parse(Some("foo=bar; bar=baz")).unwrap();

        assert_eq!(cookies.get("foo"), Some(&Value::from("bar")));
        assert_eq!(cookies.get("bar"), Some(&Value::from("baz")));
        assert!(cookies.signed_cookies().is_empty());
    }

    #[test]
    fn absent_header_yields_empty_mappings() {
        let parser = parser(&["keyboard cat"]);
        let cookies = parser.parse(None).unwrap();

        assert!(cookies.cookies().is_empty());
        assert!(cookies.signed_cookies().is_empty());

        let cookies = parser.parse(Some("")).unwrap();
        assert!(cookies.cookies().is_empty());
        assert!(cookies.signed_cookies().is_empty());
    }

    #[test]
    fn inflates_json_cookies() {
        let parser: Parser = ParserConfig::default().into();
        let cookies = parser.parse(Some("foo=j:{\"a\":1}")).unwrap();

        assert_eq!(
            cookies.get("foo").unwrap().as_json(),
            Some(&serde_json::json!({"a": 1}))
        );
    }

    #[test]
    fn does_not_inflate_invalid_json_cookies() {
        let parser: Parser = ParserConfig::default().into();
        let cookies = parser.parse(Some("foo=j:{\"foo\":")).unwrap();

        assert_eq!(cookies.get("foo"), Some(&Value::from("j:{\"foo\":")));
    }

    #[test]
    fn signed_roundtrip_moves_the_cookie_to_the_signed_mapping() {
        let parser = parser(&["keyboard cat"]);
        let value = parser.sign_value("foobarbaz").unwrap();
        let cookies = parser.parse(Some(&format!("foo={value}"))).unwrap();

        assert_eq!(cookies.get("foo"), None);
        assert_eq!(
            cookies.get_signed("foo"),
            Some(&SignedValue::Valid(Value::from("foobarbaz")))
        );
    }

    #[test]
    fn wrong_secret_yields_failed_and_still_moves_the_cookie() {
        let issuing = parser(&["keyboard cat"]);
        let value = issuing.sign_value("foobarbaz").unwrap();

        let verifying = parser(&["nyan cat"]);
        let cookies = verifying.parse(Some(&format!("foo={value}"))).unwrap();

        assert_eq!(cookies.get("foo"), None);
        assert_eq!(cookies.get_signed("foo"), Some(&SignedValue::Failed));
    }

    #[test]
    fn signed_cookies_survive_secret_rotation() {
        let old = parser(&["old cat"]);
        let signed = old.sign_value("foobar").unwrap();
        let encrypted = old.encrypt_value("top secret").unwrap();

        let rotated = parser(&["new cat", "old cat"]);
        let header = format!("a={signed}; b={encrypted}");
        let cookies = rotated.parse(Some(&header)).unwrap();

        assert_eq!(
            cookies.get_signed("a"),
            Some(&SignedValue::Valid(Value::from("foobar")))
        );
        assert_eq!(
            cookies.get_signed("b"),
            Some(&SignedValue::Valid(Value::from("top secret")))
        );
    }

    #[test]
    fn one_failing_cookie_does_not_affect_its_siblings() {
        let parser = parser(&["keyboard cat"]);
        let good = parser.sign_value("good").unwrap();
        let bad = "s:forged.AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
        let header = format!("good={good}; bad={bad}; plain=1");
        let cookies = parser.parse(Some(&header)).unwrap();

        assert_eq!(
            cookies.get_signed("good"),
            Some(&SignedValue::Valid(Value::from("good")))
        );
        assert_eq!(cookies.get_signed("bad"), Some(&SignedValue::Failed));
        assert_eq!(cookies.get("plain"), Some(&Value::from("1")));
    }

    #[test]
    fn signed_json_cookies_are_inflated_after_verification() {
        let parser = parser(&["keyboard cat"]);
        let value = parser.sign_value("j:{\"cart\":[1,2]}").unwrap();
        let cookies = parser.parse(Some(&format!("cart={value}"))).unwrap();

        let signed = cookies.get_signed("cart").unwrap();
        assert_eq!(
            signed.value().unwrap().as_json(),
            Some(&serde_json::json!({"cart": [1, 2]}))
        );
    }

    #[test]
    fn no_secrets_leaves_signed_values_in_the_plain_mapping() {
        let issuing = parser(&["keyboard cat"]);
        let value = issuing.sign_value("foobarbaz").unwrap();

        let parser: Parser = ParserConfig::default().into();
        let cookies = parser.parse(Some(&format!("foo={value}"))).unwrap();

        // Without secrets there is no classification pass at all: the raw
        // signed value stays in the plain mapping.
        assert_eq!(cookies.get("foo"), Some(&Value::from(value.as_str())));
        assert!(cookies.signed_cookies().is_empty());
    }

    #[test]
    fn encrypted_roundtrip() {
        let parser = parser(&["keyboard cat"]);
        let value = parser.encrypt_value("top secret").unwrap();
        let cookies = parser.parse(Some(&format!("session={value}"))).unwrap();

        assert_eq!(cookies.get("session"), None);
        assert_eq!(
            cookies.get_signed("session"),
            Some(&SignedValue::Valid(Value::from("top secret")))
        );
    }

    #[test]
    fn encrypted_roundtrip_with_base64_secret_encoding() {
        let mut config =
            ParserConfig::with_secret(Secret::new("a2V5Ym9hcmQgY2F0IGtleWJvYXJkIGNhdA=="));
        config.secret_encoding = SecretEncoding::Base64;
        let parser: Parser = config.into();

        let value = parser.encrypt_value("top secret").unwrap();
        let cookies = parser.parse(Some(&format!("session={value}"))).unwrap();

        assert_eq!(
            cookies.get_signed("session"),
            Some(&SignedValue::Valid(Value::from("top secret")))
        );
    }

    #[test]
    fn sign_value_requires_a_secret() {
        let parser: Parser = ParserConfig::default().into();

        assert_eq!(parser.sign_value("foo"), None);
        assert_eq!(parser.encrypt_value("foo"), None);
    }

    #[test]
    fn populate_is_idempotent_at_the_context_level() {
        let parser = parser(&["keyboard cat"]);
        let mut context = RequestContext::new();

        parser.populate(Some("foo=bar"), &mut context).unwrap();
        // A second invocation is a no-op pass-through.
        parser.populate(Some("fizz=buzz"), &mut context).unwrap();

        let cookies = context.cookies().unwrap();
        assert_eq!(cookies.get("foo"), Some(&Value::from("bar")));
        assert_eq!(cookies.get("fizz"), None);
    }

    #[test]
    fn percent_encoded_values_are_decoded() {
        let parser: Parser = ParserConfig::default().into();
        let cookies = parser.parse(Some("name=first%20value")).unwrap();

        assert_eq!(cookies.get("name"), Some(&Value::from("first value")));
    }

    #[test]
    fn header_decoding_failure_is_an_error() {
        let parser: Parser = ParserConfig::default().into();

        assert!(parser.parse(Some("a=%F1%F2%F3%C0%C1%C2")).is_err());
    }
}
