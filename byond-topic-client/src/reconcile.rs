//! Matching decoded replies against the caller's expectation.

use crate::error::ClientError;
use byond_topic_protocol::ResponseKind;

/// Fails when the reply kind differs from the expected one.
///
/// `Any` accepts every reply.
pub fn check(expected: ResponseKind, actual: ResponseKind) -> Result<(), ClientError> {
    if expected != ResponseKind::Any && expected != actual {
        return Err(ClientError::UnexpectedResponseType { expected, actual });
    }
    Ok(())
}
