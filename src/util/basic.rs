// String-typed errors, for leaf utilities where a dedicated error type
// would be overkill.
pub type SError = String;
pub type SResult<T> = Result<T, SError>;
