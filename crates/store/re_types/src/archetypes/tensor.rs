use re_types_core::{
    AsComponents, ComponentBatch, ComponentDescriptor, RawValue, ResultExt as _,
    SerializationResult,
};

use super::Archetype;
use crate::components::TensorData;
use crate::datatypes;

/// The data of a [`Tensor`]: either loose N-D input, or an already built tensor.
#[derive(Clone, Debug, PartialEq)]
pub enum TensorInput {
    Raw(RawValue),
    Data(datatypes::TensorData),
}

/// An N-D array of numbers of any numeric type.
///
/// A tensor is always a single instance: its shape describes the array, not a number of rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    pub data: TensorInput,
}

impl Archetype for Tensor {
    const NAME: &'static str = "rerun.archetypes.Tensor";
}

impl Tensor {
    #[inline]
    pub fn descriptor_data() -> ComponentDescriptor {
        Self::descriptor::<TensorData>("data")
    }

    /// Any N-D input. Its shape becomes the tensor's shape.
    #[inline]
    pub fn new(value: impl Into<RawValue>) -> Self {
        Self {
            data: TensorInput::Raw(value.into()),
        }
    }

    #[inline]
    pub fn from_tensor_data(data: datatypes::TensorData) -> Self {
        Self {
            data: TensorInput::Data(data),
        }
    }

    fn tensor_data(&self) -> SerializationResult<datatypes::TensorData> {
        match &self.data {
            TensorInput::Raw(value) => datatypes::TensorData::from_raw(value.clone()),
            TensorInput::Data(data) => Ok(data.clone()),
        }
    }
}

impl AsComponents for Tensor {
    fn as_component_batches(&self) -> SerializationResult<Vec<ComponentBatch>> {
        let descriptor = Self::descriptor_data();
        let array = self
            .tensor_data()
            .and_then(|data| datatypes::TensorData::to_arrow(&[data]))
            .with_context(descriptor.to_string())?;
        Ok(vec![ComponentBatch::new(descriptor, array)])
    }

    #[inline]
    fn indicator(&self) -> Option<ComponentBatch> {
        Some(Self::indicator_batch())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_instance_whatever_the_shape() -> anyhow::Result<()> {
        let tensor = Tensor::new(RawValue::nd_array([2, 3, 4], (0..24_u16).collect::<Vec<_>>())?);
        let batches = tensor.as_component_batches()?;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].num_instances(), 1);
        Ok(())
    }

    #[test]
    fn bool_tensors_are_rejected() {
        let err = Tensor::new(vec![true, false]).as_component_batches().unwrap_err();
        assert!(err.is_unsupported_dtype(), "{err}");
        assert_eq!(err.location(), vec!["Tensor:data"]);
    }
}
