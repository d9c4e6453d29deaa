//! Identity key allocation.

use super::column_index::ColumnIndex;
use super::rows::row_key;
use crate::entity::EntityDescriptor;
use crate::error::{CoreError, CoreResult};
use crate::types::{ConvertError, ValueType};
use sheetdb_codec::{CellValue, Worksheet};

/// Largest integer key in the table, 0 when empty.
///
/// Unparsable and absent keys count as 0, so the result is never negative.
pub(crate) fn max_key<E>(sheet: &Worksheet, index: &ColumnIndex, descriptor: &EntityDescriptor<E>) -> i64 {
    let Some(position) = index.get(descriptor.key().column_name()) else {
        return 0;
    };
    (2..=sheet.last_row())
        .filter_map(|row| row_key(sheet, position, descriptor, row).ok())
        .filter_map(|key| key.as_i64())
        .fold(0, i64::max)
}

/// Gives every entity whose key is empty or default the next identity
/// value, in slice order. Entities that already carry a key are left alone
/// and do not consume a value.
///
/// Returns the number of keys assigned.
///
/// Fails without touching any entity when the new keys would pass
/// `i64::MAX`.
pub(crate) fn allocate_identities<E>(
    sheet: &Worksheet,
    index: &ColumnIndex,
    descriptor: &EntityDescriptor<E>,
    entities: &mut [E],
) -> CoreResult<usize> {
    let key = descriptor.key();
    let start = max_key(sheet, index, descriptor);
    let wanted = entities.iter().filter(|e| key.is_default(&key.get(e))).count();
    let exhausted = i64::try_from(wanted)
        .ok()
        .and_then(|n| start.checked_add(n))
        .is_none();
    if exhausted {
        return Err(CoreError::conversion(
            descriptor.table_name(),
            key.column_name(),
            0,
            ConvertError {
                expected: ValueType::Int,
                found: format!("identity after {start}"),
            },
        ));
    }

    let mut next = start;
    let mut assigned = 0;
    for entity in entities.iter_mut() {
        if !key.is_default(&key.get(entity)) {
            continue;
        }
        next += 1;
        key.set(entity, &CellValue::Int(next)).map_err(|e| {
            CoreError::conversion(descriptor.table_name(), key.column_name(), 0, e)
        })?;
        assigned += 1;
    }
    if assigned > 0 {
        tracing::debug!(
            table = descriptor.table_name(),
            first = start.saturating_add(1),
            last = next,
            "identity keys allocated"
        );
    }
    Ok(assigned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Ticket {
        id: Option<i64>,
    }

    fn descriptor() -> EntityDescriptor<Ticket> {
        EntityDescriptor::<Ticket>::builder("tickets")
            .identity_key("id", |t: &Ticket| t.id, |t, v| t.id = v)
            .build()
            .unwrap()
    }

    fn sheet_with_keys(keys: &[CellValue]) -> Worksheet {
        let mut sheet = Worksheet::new("tickets");
        sheet.set(1, 1, "id".into()).unwrap();
        for (i, key) in keys.iter().enumerate() {
            sheet.set(i as u32 + 2, 1, key.clone()).unwrap();
        }
        sheet
    }

    #[test]
    fn empty_table_starts_at_one() {
        let d = descriptor();
        let sheet = sheet_with_keys(&[]);
        let index = ColumnIndex::build(Some(&sheet));
        let mut batch = vec![Ticket::default(), Ticket::default()];

        assert_eq!(allocate_identities(&sheet, &index, &d, &mut batch).unwrap(), 2);
        assert_eq!(batch, vec![Ticket { id: Some(1) }, Ticket { id: Some(2) }]);
    }

    #[test]
    fn unparsable_keys_count_as_zero() {
        let d = descriptor();
        let sheet = sheet_with_keys(&["abc".into(), CellValue::Int(-5), CellValue::Empty, CellValue::Int(4)]);
        let index = ColumnIndex::build(Some(&sheet));
        assert_eq!(max_key(&sheet, &index, &d), 4);

        let negative = sheet_with_keys(&[CellValue::Int(-5)]);
        assert_eq!(max_key(&negative, &ColumnIndex::build(Some(&negative)), &d), 0);
    }

    #[test]
    fn preset_keys_do_not_consume_values() {
        let d = descriptor();
        let sheet = sheet_with_keys(&[CellValue::Int(10)]);
        let index = ColumnIndex::build(Some(&sheet));
        let mut batch = vec![
            Ticket::default(),
            Ticket { id: Some(100) },
            Ticket::default(),
        ];

        allocate_identities(&sheet, &index, &d, &mut batch).unwrap();
        assert_eq!(
            batch.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![Some(11), Some(100), Some(12)]
        );
    }

    #[test]
    fn exhausted_key_space_is_an_error() {
        let d = descriptor();
        let sheet = sheet_with_keys(&[CellValue::Int(i64::MAX)]);
        let index = ColumnIndex::build(Some(&sheet));
        let mut batch = vec![Ticket::default()];

        let err = allocate_identities(&sheet, &index, &d, &mut batch).unwrap_err();
        assert!(matches!(err, CoreError::Conversion { .. }));
        assert_eq!(batch, vec![Ticket::default()]);

        let mut preset = vec![Ticket { id: Some(3) }];
        assert_eq!(allocate_identities(&sheet, &index, &d, &mut preset).unwrap(), 0);
    }

    #[test]
    fn last_identity_fits() {
        let d = descriptor();
        let sheet = sheet_with_keys(&[CellValue::Int(i64::MAX - 1)]);
        let index = ColumnIndex::build(Some(&sheet));
        let mut batch = vec![Ticket::default()];

        assert_eq!(allocate_identities(&sheet, &index, &d, &mut batch).unwrap(), 1);
        assert_eq!(batch[0].id, Some(i64::MAX));
    }

    proptest::proptest! {
        #[test]
        fn allocation_is_consecutive_after_max(
            existing in proptest::collection::vec(0i64..500, 0..8),
            presets in proptest::collection::vec(proptest::option::of(1_000i64..2_000), 0..8),
        ) {
            let d = descriptor();
            let keys: Vec<CellValue> = existing.iter().map(|k| CellValue::Int(*k)).collect();
            let sheet = sheet_with_keys(&keys);
            let index = ColumnIndex::build(Some(&sheet));
            let mut batch: Vec<Ticket> = presets.iter().map(|id| Ticket { id: *id }).collect();

            allocate_identities(&sheet, &index, &d, &mut batch).unwrap();

            let mut next = existing.iter().copied().max().unwrap_or(0);
            for (preset, ticket) in presets.iter().zip(&batch) {
                if preset.is_none() {
                    next += 1;
                }
                proptest::prop_assert_eq!(ticket.id, Some(preset.unwrap_or(next)));
            }
        }
    }
}

