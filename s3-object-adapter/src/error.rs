/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

use aws_sdk_s3::error::ProvideErrorMetadata;

/// A boxed error that is `Send` and `Sync`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by this library
///
/// NOTE: Use [`aws_sdk_s3::error::DisplayErrorContext`] or similar to display
/// the entire error cause/source chain.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: BoxError,
}

/// General categories of adapter errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The object store could not be reached, or an operation against it failed.
    ///
    /// This is the kind surfaced by every adapter operation that talks to the backend.
    /// A missing object is reported with this kind as well.
    ObjectStoreUnavailable,

    /// Resource not found (e.g. bucket or key). Only reported by the [`ObjectStore`] layer.
    ///
    /// [`ObjectStore`]: crate::store::ObjectStore
    NotFound,

    /// Operation input or configuration validation issues
    InputInvalid,

    /// A stored metadata value could not be interpreted (e.g. a non-integer counter)
    InvalidMetadata,

    /// I/O errors
    IOError,

    /// Some kind of internal runtime issue (e.g. a closed semaphore)
    RuntimeError,
}

impl Error {
    /// Creates a new adapter [`Error`] from a known kind of error as well as an arbitrary error
    /// source.
    pub fn new<E>(kind: ErrorKind, err: E) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            kind,
            source: err.into(),
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns true if the backend reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::ObjectStoreUnavailable => write!(f, "object store not accessible"),
            ErrorKind::NotFound => write!(f, "resource not found"),
            ErrorKind::InputInvalid => write!(f, "invalid input"),
            ErrorKind::InvalidMetadata => write!(f, "invalid metadata value"),
            ErrorKind::IOError => write!(f, "I/O error"),
            ErrorKind::RuntimeError => write!(f, "runtime error"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<aws_smithy_types::error::operation::BuildError> for Error {
    fn from(value: aws_smithy_types::error::operation::BuildError) -> Self {
        Self::new(ErrorKind::InputInvalid, value)
    }
}

impl From<aws_smithy_types::byte_stream::error::Error> for Error {
    fn from(value: aws_smithy_types::byte_stream::error::Error) -> Self {
        Self::new(ErrorKind::IOError, value)
    }
}

impl From<tokio::sync::AcquireError> for Error {
    fn from(value: tokio::sync::AcquireError) -> Self {
        Self::new(ErrorKind::RuntimeError, value)
    }
}

impl<E, R> From<aws_sdk_s3::error::SdkError<E, R>> for Error
where
    E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
    R: Send + Sync + fmt::Debug + 'static,
{
    fn from(value: aws_sdk_s3::error::SdkError<E, R>) -> Self {
        let kind = match value.code() {
            Some("NotFound" | "NoSuchKey" | "NoSuchBucket") => ErrorKind::NotFound,
            _ => ErrorKind::ObjectStoreUnavailable,
        };

        Error::new(kind, value)
    }
}

pub(crate) fn invalid_input<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::InputInvalid, err)
}

pub(crate) fn not_found<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::NotFound, err)
}

pub(crate) fn invalid_metadata<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::InvalidMetadata, err)
}

/// Wrap a failure from any layer below the facade as [`ErrorKind::ObjectStoreUnavailable`].
///
/// Errors that already carry that kind, or that describe bad metadata rather than a backend
/// problem, are passed through untouched.
pub(crate) fn unavailable(err: Error) -> Error {
    match err.kind() {
        ErrorKind::ObjectStoreUnavailable | ErrorKind::InvalidMetadata => err,
        _ => Error::new(ErrorKind::ObjectStoreUnavailable, err),
    }
}
