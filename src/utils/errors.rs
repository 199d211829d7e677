use bcrypt::BcryptError;
use mongodb::bson;
use tokio::task::JoinError;
use tonic::{Code, Status};
use bson::document::ValueAccessError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ErrorCode {
    TonicStartError                 = 0400,
    HashThreadingIssue              = 0401,
    UnableToReadCredentials         = 0500,
    IOError                         = 0501,
    MongoDBError                    = 0503,
    InvalidBSON                     = 0504,
    InvalidJSON                     = 0505,
    BSONFieldNotFound               = 0507,
    HashingError                    = 0509,
    InvalidPHCFormat                = 0510,
    UnknownAlgorithmVariant         = 0511,
    TokenSigningError               = 0512,
    PasswordDoesNotMeetPolicy       = 2000,
    PasswordTooShort                = 2002,
    PasswordMissingLowercase        = 2005,
    PasswordMissingUppercase        = 2006,
    PasswordMissingNumber           = 2007,
    PasswordMissingSymbol           = 2009,
    PasswordUsedBefore              = 2012,
    InvalidEmail                    = 2020,
    FieldMandatory                  = 2021,
    InvalidCredentials              = 2103,
    AccountSoftLocked               = 2105,
    AccountHardLocked               = 2106,
    AccountInactive                 = 2107,
    TwoFactorRequired               = 2108,
    InvalidTwoFactorCode            = 2109,
    TwoFactorNotSetup               = 2110,
    TwoFactorAlreadyEnabled         = 2111,
    EmailAlreadyRegistered          = 2201,
    MissingToken                    = 2301,
    InvalidToken                    = 2302,
    TokenExpired                    = 2303,
    AdminRequired                   = 2304,
    AccountNotFound                 = 2401,
    TooManyRequests                 = 2501,
}

impl ErrorCode {
    pub fn with_msg(&self, message: &str) -> WardenError {
        WardenError::new(*self, message)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WardenError {
    error_code: ErrorCode,
    message: String,
}

impl WardenError {
    pub fn new(error_code: ErrorCode, message: &str) -> Self {
        WardenError { error_code, message: message.to_string() }
    }

    pub fn error_code(&self) -> ErrorCode {
        self.error_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<tonic::transport::Error> for WardenError {
    fn from(error: tonic::transport::Error) -> Self {
        ErrorCode::TonicStartError.with_msg(&format!("Failed to start gRPC server: {}", error))
    }
}

impl From<password_hash::Error> for WardenError {
    fn from(error: password_hash::Error) -> Self {
        ErrorCode::HashingError.with_msg(&format!("Unable to hash password: {}", error))
    }
}

impl From<argon2::Error> for WardenError {
    fn from(error: argon2::Error) -> Self {
        ErrorCode::HashingError.with_msg(&format!("Invalid configuration for algorithm: {}", error))
    }
}

impl From<BcryptError> for WardenError {
    fn from(error: BcryptError) -> Self {
        ErrorCode::HashingError.with_msg(&format!("Unable to hash: {}", error))
    }
}

impl From<serde_json::Error> for WardenError {
    fn from(error: serde_json::Error) -> Self {
        ErrorCode::InvalidJSON.with_msg(&format!("Unable to convert to json: {}", error))
    }
}

impl From<mongodb::error::Error> for WardenError {
    fn from(error: mongodb::error::Error) -> Self {
        ErrorCode::MongoDBError.with_msg(&format!("MongoDB error: {}", error))
    }
}

impl From<ValueAccessError> for WardenError {
    fn from(error: ValueAccessError) -> Self {
        ErrorCode::BSONFieldNotFound.with_msg(&format!("Unable to read BSON: {}", error))
    }
}

impl From<bson::ser::Error> for WardenError {
    fn from(error: bson::ser::Error) -> Self {
        ErrorCode::InvalidBSON.with_msg(&format!("Unable to serialise BSON: {}", error))
    }
}

impl From<bson::de::Error> for WardenError {
    fn from(error: bson::de::Error) -> Self {
        ErrorCode::InvalidBSON.with_msg(&format!("Unable to deserialise BSON: {}", error))
    }
}

impl From<JoinError> for WardenError {
    fn from(error: JoinError) -> Self {
        ErrorCode::HashThreadingIssue.with_msg(&format!("Unable to hash: {}", error))
    }
}

impl From<jsonwebtoken::errors::Error> for WardenError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        match error.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                ErrorCode::TokenExpired.with_msg("The session token has expired")
            },
            _ => ErrorCode::InvalidToken.with_msg("The session token is not valid"),
        }
    }
}

///
/// Convert our internal error into a gRPC status response.
///
impl From<WardenError> for Status {
    fn from(error: WardenError) -> Self {
        use ErrorCode::*;

        let code = match &error.error_code {
            BSONFieldNotFound       |
            HashingError            |
            HashThreadingIssue      |
            InvalidBSON             |
            InvalidJSON             |
            InvalidPHCFormat        |
            IOError                 |
            MongoDBError            |
            TokenSigningError       |
            TonicStartError         |
            UnableToReadCredentials |
            UnknownAlgorithmVariant => Code::Internal,

            FieldMandatory            |
            InvalidEmail              |
            PasswordDoesNotMeetPolicy |
            PasswordMissingLowercase  |
            PasswordMissingNumber     |
            PasswordMissingSymbol     |
            PasswordMissingUppercase  |
            PasswordTooShort => Code::InvalidArgument,

            EmailAlreadyRegistered  |
            PasswordUsedBefore      |
            TwoFactorAlreadyEnabled => Code::AlreadyExists,

            InvalidCredentials   |
            InvalidToken         |
            InvalidTwoFactorCode |
            MissingToken         |
            TokenExpired         |
            TwoFactorRequired => Code::Unauthenticated,

            AccountHardLocked |
            AccountInactive   |
            AccountSoftLocked |
            AdminRequired => Code::PermissionDenied,

            TwoFactorNotSetup => Code::FailedPrecondition,

            AccountNotFound => Code::NotFound,

            TooManyRequests => Code::ResourceExhausted,
        };

        Status::with_details(code, error.message, format!("{}", error.error_code as u32).into())
    }
}
