use crate::types::DoctorStatus;
use std::fmt;

/// Error categories for classifying failures at the initiating action.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorCategory {
    /// Missing or invalid form input; raised before any external call.
    Validation,
    /// The connected account lacks the required role.
    Authorization,
    /// The requested transition conflicts with stored state.
    StateConflict,
    /// A collaborator (chain, store, gateway, wallet) failed or rejected the call.
    External,
}

/// External collaborator a call was made against.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Service {
    Chain,
    Metadata,
    Upload,
    Wallet,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Service::Chain => "chain",
            Service::Metadata => "metadata store",
            Service::Upload => "upload gateway",
            Service::Wallet => "wallet",
        })
    }
}

/// Failure reported by a collaborator. The message is kept verbatim.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ExternalError {
    pub service: Service,
    pub message: String,
}

impl ExternalError {
    pub fn new(service: Service, message: impl Into<String>) -> Self {
        Self {
            service,
            message: message.into(),
        }
    }

    pub fn chain(message: impl Into<String>) -> Self {
        Self::new(Service::Chain, message)
    }

    pub fn metadata(message: impl Into<String>) -> Self {
        Self::new(Service::Metadata, message)
    }

    pub fn upload(message: impl Into<String>) -> Self {
        Self::new(Service::Upload, message)
    }

    pub fn wallet(message: impl Into<String>) -> Self {
        Self::new(Service::Wallet, message)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    External(#[from] ExternalError),
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Please select a file")]
    NoFileSelected,
    #[error("Please connect your wallet")]
    WalletNotConnected,
    #[error("Upload failed: the gateway did not accept the file")]
    UploadRejected,
    #[error("You are not the admin")]
    NotAuthorized,
    #[error("cannot move a {from} application to {to}")]
    InvalidTransition {
        from: DoctorStatus,
        to: DoctorStatus,
    },
    #[error("this application has already been {0}")]
    ApplicationClosed(DoctorStatus),
}

impl Error {
    /// Returns the error category for this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MissingField(_)
            | Error::NoFileSelected
            | Error::WalletNotConnected
            | Error::UploadRejected => ErrorCategory::Validation,
            Error::NotAuthorized => ErrorCategory::Authorization,
            Error::InvalidTransition { .. } | Error::ApplicationClosed(_) => {
                ErrorCategory::StateConflict
            }
            Error::External(_) => ErrorCategory::External,
        }
    }

    /// The collaborator involved, for external failures.
    pub fn service(&self) -> Option<Service> {
        match self {
            Error::External(e) => Some(e.service),
            _ => None,
        }
    }

    /// Message shown to the user. External messages pass through unchanged.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
