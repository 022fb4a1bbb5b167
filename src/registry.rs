//! Process-wide type registry for polymorphic decoding
//!
//! An [`Identified`](crate::node::Node::Identified) node names its concrete
//! type with a string identifier. This registry maps each identifier to a
//! factory able to rebuild the value from a decoder positioned over the
//! node's items. Registration must happen before any decode of that
//! identifier is attempted; decoding an identifier with no entry fails with
//! [`UnregisteredCustomType`](crate::error::CerealError::UnregisteredCustomType).
//!
//! The registry is not versioned: re-registering an identifier silently
//! replaces the previous factory, and the last registration wins.
//!
//! Lock discipline: [`resolve`] copies the factory pointer out under the
//! read lock and releases it before the factory runs, so a factory that
//! recursively decodes further identified records on the same thread can
//! never deadlock against its caller.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use lazy_static::lazy_static;

use crate::conv::IdentifiedCerealType;
use crate::decode::Decoder;
use crate::error::{CerealError, CerealResult};

/// Reconstruction function stored per identifier.
///
/// The factory receives a decoder over the identified record's items and
/// must itself consume it to build the value.
pub type Factory = for<'a> fn(Decoder<'a>) -> CerealResult<Box<dyn Any + Send + Sync>>;

lazy_static! {
    static ref REGISTRY: RwLock<HashMap<String, Factory>> = RwLock::new(HashMap::new());
}

fn construct<T>(dec: Decoder<'_>) -> CerealResult<Box<dyn Any + Send + Sync>>
where
    T: IdentifiedCerealType + Send + Sync + 'static,
{
    let dec = dec.shaped::<T>();
    Ok(Box::new(T::decode(&dec)?))
}

/// Registers `T` under its identifier, replacing any previous entry.
pub fn register<T>()
where
    T: IdentifiedCerealType + Send + Sync + 'static,
{
    REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(T::IDENTIFIER.to_owned(), construct::<T>);
}

/// Looks up the factory for `identifier`.
pub fn resolve(identifier: &str) -> CerealResult<Factory> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(identifier)
        .copied()
        .ok_or_else(|| CerealError::UnregisteredCustomType {
            identifier: identifier.to_owned(),
        })
}

/// Whether `identifier` currently has an entry.
pub fn is_registered(identifier: &str) -> bool {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .contains_key(identifier)
}

/// Empties the registry. Test support; production code has no reason to
/// call this.
pub fn clear() {
    REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}

#[cfg(test)]
pub(crate) mod testing {
    //! Serialization of registry-mutating tests.
    //!
    //! The registry is process-wide; tests that call [`clear`](super::clear)
    //! or assert on registration state take this lock so the default
    //! multi-threaded test runner cannot interleave them.

    use std::sync::{Mutex, MutexGuard, PoisonError};

    use lazy_static::lazy_static;

    lazy_static! {
        static ref GUARD: Mutex<()> = Mutex::new(());
    }

    pub(crate) fn lock() -> MutexGuard<'static, ()> {
        GUARD.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conv::CerealType;
    use crate::encode::Encoder;

    #[derive(Debug, PartialEq)]
    struct Marker {
        id: i32,
    }

    impl CerealType for Marker {
        fn encode(&self, enc: &mut Encoder) -> CerealResult<()> {
            enc.encode(self.id, "id");
            Ok(())
        }

        fn decode(dec: &Decoder<'_>) -> CerealResult<Self> {
            Ok(Self {
                id: dec.require("id")?,
            })
        }
    }

    impl IdentifiedCerealType for Marker {
        const IDENTIFIER: &'static str = "registry-test-marker";
    }

    #[test]
    fn resolve_fails_until_registered() {
        let _guard = testing::lock();
        clear();
        assert_eq!(
            resolve(Marker::IDENTIFIER),
            Err(CerealError::UnregisteredCustomType {
                identifier: Marker::IDENTIFIER.to_owned()
            })
        );
        register::<Marker>();
        assert!(resolve(Marker::IDENTIFIER).is_ok());
        assert!(is_registered(Marker::IDENTIFIER));
    }

    #[test]
    fn reregistration_is_silent() {
        let _guard = testing::lock();
        register::<Marker>();
        register::<Marker>();
        assert!(is_registered(Marker::IDENTIFIER));
    }

    #[test]
    fn clear_empties_the_map() {
        let _guard = testing::lock();
        register::<Marker>();
        clear();
        assert!(!is_registered(Marker::IDENTIFIER));
    }
}
