//! The self-describing encoding of component batches, as they are handed to a sink.
//!
//! Each batch is an Arrow IPC stream holding a single one-column record batch. The field carries
//! the [`ComponentDescriptor`] and the arity as metadata, so that a reader without any knowledge
//! of the component (e.g. a user-defined one) can still recover its structure.

use std::sync::Arc;

use arrow::array::{ArrayRef, RecordBatch};
use arrow::datatypes::{DataType, Field, Schema};
use re_types_core::{ComponentBatch, ComponentDescriptor};

use crate::{ChunkError, ChunkResult};

/// Field metadata key holding the number of scalars per instance.
pub const FIELD_METADATA_KEY_ARITY: &str = "rerun:arity";

/// One encoded component batch.
#[derive(Clone, PartialEq, Eq)]
pub struct WireBatch {
    pub descriptor: ComponentDescriptor,

    /// Number of instances in the batch.
    pub num_rows: usize,

    /// Arrow IPC stream bytes.
    pub payload: Vec<u8>,
}

impl std::fmt::Debug for WireBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireBatch")
            .field("descriptor", &self.descriptor)
            .field("num_rows", &self.num_rows)
            .field("payload", &format_args!("{} bytes", self.payload.len()))
            .finish()
    }
}

/// What a reader learns about a batch from its schema alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireSchemaInfo {
    pub descriptor: ComponentDescriptor,

    /// The datatype of the innermost values, e.g. `Float32` for a 3D position.
    pub element_type: DataType,

    pub arity: usize,
}

impl WireSchemaInfo {
    pub fn from_field(field: &Field) -> Self {
        let arity = field
            .metadata()
            .get(FIELD_METADATA_KEY_ARITY)
            .and_then(|arity| arity.parse().ok())
            .unwrap_or_else(|| match field.data_type() {
                DataType::FixedSizeList(_, size) => usize::try_from(*size).unwrap_or(1),
                _ => 1,
            });

        Self {
            descriptor: ComponentDescriptor::from_field(field),
            element_type: leaf_datatype(field.data_type()).clone(),
            arity,
        }
    }
}

fn leaf_datatype(datatype: &DataType) -> &DataType {
    match datatype {
        DataType::FixedSizeList(inner, _)
        | DataType::List(inner)
        | DataType::LargeList(inner) => leaf_datatype(inner.data_type()),
        _ => datatype,
    }
}

/// Encodes a batch into a self-describing [`WireBatch`].
pub fn encode_batch(batch: &ComponentBatch) -> ChunkResult<WireBatch> {
    let mut metadata = batch.descriptor.to_field_metadata();
    metadata.insert(FIELD_METADATA_KEY_ARITY.to_owned(), batch.arity().to_string());

    let field = Field::new(
        batch.descriptor.component.as_str(),
        batch.array.data_type().clone(),
        true,
    )
    .with_metadata(metadata);

    let schema = Arc::new(Schema::new(vec![field]));
    let record_batch = RecordBatch::try_new(schema.clone(), vec![batch.array.clone()])?;

    let mut payload = Vec::new();
    {
        let mut writer = arrow::ipc::writer::StreamWriter::try_new(&mut payload, &schema)?;
        writer.write(&record_batch)?;
        writer.finish()?;
    }

    Ok(WireBatch {
        descriptor: batch.descriptor.clone(),
        num_rows: batch.num_instances(),
        payload,
    })
}

/// Encodes all batches, in order.
pub fn encode_batches<'a>(
    batches: impl IntoIterator<Item = &'a ComponentBatch>,
) -> ChunkResult<Vec<WireBatch>> {
    batches.into_iter().map(encode_batch).collect()
}

/// Decodes a [`WireBatch`] back into its schema information and data.
pub fn decode_batch(wire: &WireBatch) -> ChunkResult<(WireSchemaInfo, ArrayRef)> {
    let mut reader =
        arrow::ipc::reader::StreamReader::try_new(std::io::Cursor::new(&wire.payload), None)?;

    let record_batch = reader.next().ok_or_else(|| ChunkError::Malformed {
        reason: format!("{}: payload holds no record batch", wire.descriptor),
    })??;

    let schema = record_batch.schema();
    let (Some(field), Some(array)) = (schema.fields().first(), record_batch.columns().first())
    else {
        return Err(ChunkError::Malformed {
            reason: format!("{}: payload holds no column", wire.descriptor),
        });
    };

    if array.len() != wire.num_rows {
        return Err(ChunkError::Malformed {
            reason: format!(
                "{}: expected {} row(s), payload holds {}",
                wire.descriptor,
                wire.num_rows,
                array.len()
            ),
        });
    }

    Ok((WireSchemaInfo::from_field(field), array.clone()))
}

#[cfg(test)]
mod tests {
    use arrow::array::{Array as _, AsArray as _, UnionArray};
    use re_types_core::{ComponentBatch, ComponentDescriptor, ElementType, normalize};

    use super::*;

    #[test]
    fn schema_survives_without_registry() -> anyhow::Result<()> {
        let descriptor = ComponentDescriptor::new("confidence")
            .with_archetype("user.Sensor")
            .with_component_type("user.Confidence");
        let batch = ComponentBatch::from_normalized(
            descriptor.clone(),
            normalize(vec![[1_i16, 2], [3, 4], [5, 6]], 2)?,
        )?;

        let wire = encode_batch(&batch)?;
        assert_eq!(wire.num_rows, 3);

        let (info, array) = decode_batch(&wire)?;
        similar_asserts::assert_eq!(
            info,
            WireSchemaInfo {
                descriptor,
                element_type: ElementType::I16.arrow_datatype(),
                arity: 2,
            }
        );
        assert_eq!(&array, &batch.array);
        Ok(())
    }

    #[test]
    fn unions_keep_their_discriminants() -> anyhow::Result<()> {
        let set = re_types_core::VariantSet::new([
            (1, Field::new("a", DataType::Int32, false)),
            (2, Field::new("b", DataType::Utf8, false)),
        ]);
        let union = UnionArray::try_new(
            set.union_fields().clone(),
            vec![2_i8].into(),
            Some(vec![0_i32].into()),
            vec![
                arrow::array::new_empty_array(&DataType::Int32),
                Arc::new(arrow::array::StringArray::from(vec!["x"])),
            ],
        )?;
        let batch = ComponentBatch::new(ComponentDescriptor::new("variant"), Arc::new(union));

        let (_, array) = decode_batch(&encode_batch(&batch)?)?;
        let union = array.as_union();
        assert_eq!(union.type_id(0), 2);
        assert_eq!(union.child(1).len(), 0);
        Ok(())
    }

    #[test]
    fn row_count_is_checked() -> anyhow::Result<()> {
        let batch = ComponentBatch::from_strings(ComponentDescriptor::new("labels"), ["a"]);
        let mut wire = encode_batch(&batch)?;
        wire.num_rows = 2;
        assert!(matches!(decode_batch(&wire), Err(ChunkError::Malformed { .. })));
        Ok(())
    }
}
