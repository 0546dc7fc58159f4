use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::constructor::ConstructorShadow;
use crate::mock::CallableMock;
use crate::mock_key::MockKey;
use crate::patch::Patch;
use crate::Error;

/// Something a session undoes when it finishes.
pub(crate) enum Interception {
    Patch(Patch),
    Constructor(Arc<ConstructorShadow>),
}

impl Interception {
    fn reverse(self) -> Result<(), Error> {
        match self {
            Interception::Patch(patch) => patch.reverse(),
            Interception::Constructor(shadow) => {
                shadow.reverse();
                Ok(())
            }
        }
    }
}

/// The registry of a session: installed mocks by key and every
/// interception in the order it was made.
#[derive(Default)]
pub(crate) struct Mocks {
    callables: HashMap<MockKey, Arc<CallableMock>>,
    constructors: HashMap<MockKey, (Arc<ConstructorShadow>, Arc<CallableMock>)>,
    interceptions: Vec<Interception>,
}

impl Mocks {
    pub fn callable(&self, key: &MockKey) -> Option<Arc<CallableMock>> {
        self.callables.get(key).cloned()
    }

    pub fn insert_callable(&mut self, key: MockKey, mock: Arc<CallableMock>, patch: Patch) {
        self.callables.insert(key, mock);
        self.interceptions.push(Interception::Patch(patch));
    }

    pub fn constructor(&self, key: &MockKey) -> Option<(Arc<ConstructorShadow>, Arc<CallableMock>)> {
        self.constructors.get(key).cloned()
    }

    pub fn insert_constructor(
        &mut self,
        key: MockKey,
        shadow: Arc<ConstructorShadow>,
        mock: Arc<CallableMock>,
    ) {
        self.constructors.insert(key, (shadow, mock));
    }

    pub fn push(&mut self, interception: Interception) {
        self.interceptions.push(interception);
    }

    /// Reverses every interception, newest first, without stopping at
    /// failures. The registry is empty afterwards.
    pub fn reverse_all(&mut self) -> Vec<Error> {
        self.callables.clear();
        self.constructors.clear();
        let mut errors = Vec::new();
        while let Some(interception) = self.interceptions.pop() {
            if let Err(error) = interception.reverse() {
                warn!(%error, "failed to reverse interception");
                errors.push(error);
            }
        }
        errors
    }
}
