//! Lock keys: the validated path segments that identify one critical section
//! inside a registry, and the factories that derive them from caller values.

mod factory;
mod lock_key;
mod value;
mod word;

pub use factory::{
    BuiltinKeyFactory, IntegerLockKeyFactory, LockKeyFactory, LongLockKeyFactory,
    StringLockKeyFactory, ToStringLockKeyFactory, WordLockKeyFactory,
};
pub use lock_key::LockKey;
pub use value::KeyValue;
pub use word::Word;
