// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The central error-code → HTTP-status table, and the mapping from
//! the engine taxonomy to each service's native code names.

use lws_core::EngineError;

/// Response format for service error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorFormat {
    Json,
    XmlObjectStore,
    XmlIdentity,
}

impl ErrorFormat {
    /// The format each service speaks.
    pub fn for_service(service: &str) -> Self {
        match service {
            "s3" => ErrorFormat::XmlObjectStore,
            "sts" => ErrorFormat::XmlIdentity,
            _ => ErrorFormat::Json,
        }
    }
}

/// HTTP status for a wire error code. Unknown codes fall back to 400,
/// matching how the cloud treats most client mistakes.
pub fn status_for(code: &str) -> u16 {
    match code {
        // Generic
        "AccessDeniedException" => 403,
        "InvalidParameterException" => 400,
        "InvalidParameterValueException" => 400,
        "ValidationException" => 400,
        "DuplicateResourceException" => 409,
        "LimitExceededException" => 429,
        "ResourceNotFoundException" => 404,
        "InvalidStateException" => 409,
        "ServiceUnavailableException" => 503,
        "InternalServerError" => 500,
        "ThrottlingException" => 429,
        "RequestTimeout" => 504,
        // Identity / tokens
        "NoSuchEntity" => 404,
        "MalformedPolicyDocument" => 400,
        "EntityAlreadyExists" => 409,
        "UserNotFoundException" => 404,
        "UsernameExistsException" => 400,
        "NotAuthorizedException" => 401,
        // Object store
        "NoSuchKey" => 404,
        "NoSuchBucket" => 404,
        "BucketAlreadyExists" => 409,
        "BucketAlreadyOwnedByYou" => 409,
        "AccessDenied" => 403,
        // Tables
        "ConditionalCheckFailedException" => 400,
        "TransactionCanceledException" => 400,
        "ProvisionedThroughputExceededException" => 400,
        // Queues
        "QueueDoesNotExist" => 400,
        "QueueNameExists" => 400,
        "ReceiptHandleIsInvalid" => 404,
        // State machines
        "StateMachineDoesNotExist" => 400,
        "ExecutionDoesNotExist" => 400,
        // Topics
        "NotFoundException" => 404,
        // Event buses
        "ResourceAlreadyExistsException" => 409,
        // Parameters / secrets
        "ParameterNotFound" => 400,
        "ParameterAlreadyExists" => 400,
        _ => 400,
    }
}

/// Service-native code for an engine error.
pub fn wire_code(service: &str, err: &EngineError) -> &'static str {
    match err {
        EngineError::NotFound { resource, .. } => not_found_code(service, resource),
        EngineError::AlreadyExists { resource, .. } => already_exists_code(service, resource),
        EngineError::Validation(_) => match service {
            "s3" => "InvalidRequest",
            _ => "ValidationException",
        },
        EngineError::ConditionFailed(_) => "ConditionalCheckFailedException",
        EngineError::TransactionCanceled { .. } => "TransactionCanceledException",
        EngineError::Throttled(_) => "ThrottlingException",
        EngineError::PermissionDenied(_) => match service {
            "s3" => "AccessDenied",
            _ => "AccessDeniedException",
        },
        EngineError::Timeout(_) => "RequestTimeout",
        EngineError::Internal(_) => "InternalServerError",
    }
}

fn not_found_code(service: &str, resource: &str) -> &'static str {
    match (service, resource) {
        ("sqs", _) => "QueueDoesNotExist",
        ("s3", "bucket") => "NoSuchBucket",
        ("s3", _) => "NoSuchKey",
        ("sns", _) => "NotFoundException",
        ("stepfunctions", "execution") => "ExecutionDoesNotExist",
        ("stepfunctions", _) => "StateMachineDoesNotExist",
        ("cognito-idp", "user") => "UserNotFoundException",
        ("ssm", _) => "ParameterNotFound",
        _ => "ResourceNotFoundException",
    }
}

fn already_exists_code(service: &str, resource: &str) -> &'static str {
    match (service, resource) {
        ("sqs", _) => "QueueNameExists",
        ("s3", _) => "BucketAlreadyExists",
        ("cognito-idp", "user") => "UsernameExistsException",
        ("ssm", _) => "ParameterAlreadyExists",
        ("events", _) | ("sns", _) => "ResourceAlreadyExistsException",
        _ => "DuplicateResourceException",
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
