use super::{ClientId, Collection, Model};

/// Anything that takes part in graph conversion: a Model or a Collection.
#[derive(Debug, Clone)]
pub enum DataComponent {
    Model(Model),
    Collection(Collection),
}

impl DataComponent {
    pub fn client_id(&self) -> ClientId {
        match self {
            DataComponent::Model(model) => model.client_id(),
            DataComponent::Collection(collection) => collection.client_id(),
        }
    }

    pub fn as_model(&self) -> Option<&Model> {
        match self {
            DataComponent::Model(model) => Some(model),
            DataComponent::Collection(_) => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            DataComponent::Collection(collection) => Some(collection),
            DataComponent::Model(_) => None,
        }
    }
}

impl From<Model> for DataComponent {
    fn from(model: Model) -> Self {
        DataComponent::Model(model)
    }
}

impl From<&Model> for DataComponent {
    fn from(model: &Model) -> Self {
        DataComponent::Model(model.clone())
    }
}

impl From<Collection> for DataComponent {
    fn from(collection: Collection) -> Self {
        DataComponent::Collection(collection)
    }
}

impl From<&Collection> for DataComponent {
    fn from(collection: &Collection) -> Self {
        DataComponent::Collection(collection.clone())
    }
}
