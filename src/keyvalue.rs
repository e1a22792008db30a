//! Handle to one remote key-value slot

use http::Method;
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::transport::{encode_component, Transport};
use crate::types::Credentials;

/// Split a creation reply of the form `.../<token>/<key>` into token and key.
///
/// The key segment is percent-decoded since the service echoes it the way
/// it appeared in the request path.
fn parse_creation_response(body: &str) -> Result<(String, String)> {
    let malformed = || Error::Protocol(format!("malformed creation response: {:?}", body));

    let mut segments = body.rsplit('/');
    let raw_key = segments.next().ok_or_else(malformed)?;
    let token = segments.next().ok_or_else(malformed)?;
    if token.is_empty() {
        return Err(malformed());
    }

    let key = percent_decode_str(raw_key)
        .decode_utf8()
        .map_err(|_| malformed())?
        .into_owned();

    Ok((token.to_string(), key))
}

/// A bound `(token, key)` slot on the keyvalue service.
///
/// The token and key never change after construction. The last value
/// written or read is remembered locally, but the service stays the source
/// of truth.
///
/// # Example
/// ```rust,no_run
/// use keyvalue_client::Client;
///
/// fn main() -> Result<(), keyvalue_client::Error> {
///     let client = Client::default_service()?;
///     let mut kv = client.create("some-key")?;
///
///     kv.set_and_validate("some-value")?;
///     assert_eq!(kv.get()?, "some-value");
///
///     // Later, from stored credentials and without a request
///     let saved = kv.credentials();
///     let mut again = client.key_value(&saved.token, &saved.key);
///     println!("{}", again.get()?);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct KeyValue<T: Transport = Client> {
    token: String,
    key: String,
    value: Option<String>,
    transport: T,
}

impl<T: Transport> KeyValue<T> {
    /// Ask the service to allocate a slot for `key`.
    ///
    /// # Errors
    /// [`Error::Protocol`] if the reply is not `.../<token>/<key>` or names a
    /// different key, plus any transport or remote failure.
    pub fn create(transport: T, key: &str) -> Result<Self> {
        let path = format!("/new/{}", encode_component(key));
        let body = transport.send(Method::POST, &path)?;

        let (token, returned_key) = parse_creation_response(&body)?;
        if returned_key != key {
            return Err(Error::Protocol(format!(
                "key mismatch: requested {:?}, service returned {:?}",
                key, returned_key
            )));
        }

        debug!("Created slot for key {:?}", key);

        Ok(Self {
            token,
            key: returned_key,
            value: None,
            transport,
        })
    }

    /// Handle for an already known token and key. Sends nothing and does not
    /// check that the slot exists.
    pub fn from_credentials(transport: T, token: &str, key: &str) -> Self {
        Self {
            token: token.to_string(),
            key: key.to_string(),
            value: None,
            transport,
        }
    }

    /// Same as [`KeyValue::from_credentials`], taking a stored [`Credentials`]
    pub fn with_credentials(transport: T, credentials: Credentials) -> Self {
        Self {
            token: credentials.token,
            key: credentials.key,
            value: None,
            transport,
        }
    }

    /// Token assigned by the service
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Key name
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Last value written or read through this handle, if any
    pub fn cached_value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The token and key, ready to be stored
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.token.clone(), self.key.clone())
    }

    fn slot_path(&self) -> String {
        format!(
            "/{}/{}",
            encode_component(&self.token),
            encode_component(&self.key)
        )
    }

    /// Store `value` in the slot
    pub fn set(&mut self, value: &str) -> Result<()> {
        let path = format!("{}/{}", self.slot_path(), encode_component(value));
        self.transport.send(Method::POST, &path)?;
        self.value = Some(value.to_string());
        Ok(())
    }

    /// Store `value`, read it back and require an exact match.
    ///
    /// A mismatch is reported after the write has already happened. Another
    /// writer on the same slot between the two requests also shows up as a
    /// mismatch.
    pub fn set_and_validate(&mut self, value: &str) -> Result<()> {
        self.set(value)?;

        let returned = self.get()?;
        if returned != value {
            warn!("Read-back of key {:?} differs from the written value", self.key);
            return Err(Error::Validation(format!(
                "round-trip mismatch: wrote {:?}, read back {:?}",
                value, returned
            )));
        }

        Ok(())
    }

    /// Serialize `obj` to JSON and store it.
    ///
    /// Serialization happens before any request, so a failure leaves the slot
    /// untouched.
    pub fn set_object<S>(&mut self, obj: &S) -> Result<()>
    where
        S: Serialize + ?Sized,
    {
        let json = serde_json::to_string(obj)?;
        self.set(&json)
    }

    /// Store `obj` as JSON, read it back and let `equals` judge the result.
    ///
    /// `equals` receives the raw returned text and the original object.
    pub fn set_object_and_validate<S, F>(&mut self, obj: &S, equals: F) -> Result<()>
    where
        S: Serialize + ?Sized,
        F: FnOnce(&str, &S) -> bool,
    {
        let json = serde_json::to_string(obj)?;
        self.set(&json)?;

        let returned = self.get()?;
        if !equals(&returned, obj) {
            warn!("Validation predicate rejected read-back of key {:?}", self.key);
            return Err(Error::Validation(format!(
                "predicate rejected returned value {:?}, written {:?}",
                returned, json
            )));
        }

        Ok(())
    }

    /// [`KeyValue::set_object_and_validate`] comparing with `PartialEq` after
    /// deserializing the returned text. Text that does not deserialize is a
    /// validation failure.
    pub fn set_object_and_validate_eq<S>(&mut self, obj: &S) -> Result<()>
    where
        S: Serialize + DeserializeOwned + PartialEq,
    {
        self.set_object_and_validate(obj, |returned, original| {
            serde_json::from_str::<S>(returned)
                .map(|parsed| parsed == *original)
                .unwrap_or(false)
        })
    }

    /// Read the slot's current value, with a single trailing newline removed
    pub fn get(&mut self) -> Result<String> {
        let value = self.transport.send(Method::GET, &self.slot_path())?;
        self.value = Some(value.clone());
        Ok(value)
    }

    /// Read the slot and deserialize it from JSON
    pub fn get_object<D: DeserializeOwned>(&mut self) -> Result<D> {
        let text = self.get()?;
        Ok(serde_json::from_str(&text)?)
    }
}
