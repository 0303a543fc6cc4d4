//! Row iteration and stream shutdown.

use std::any::{type_name, Any};

use eyre::{Result, WrapErr};
use tracing::warn;

use super::plan::ScanPlan;
use super::Destination;
use crate::error::{MappingError, ScanError};
use crate::reflect::TypeInfo;
use crate::rows::RowStream;

fn downcast<T: 'static>(value: Box<dyn Any>) -> Result<T> {
    value
        .downcast::<T>()
        .map(|value| *value)
        .map_err(|_| {
            MappingError::DescriptorMismatch {
                expected: type_name::<T>(),
            }
            .into()
        })
}

/// Scans the single cell of every row into a fresh `T`.
pub(crate) fn drive_scalars<T, D, R>(info: &TypeInfo, dst: &mut D, rows: &mut R) -> Result<()>
where
    T: 'static,
    D: Destination<T> + ?Sized,
    R: RowStream + ?Sized,
{
    let new = info.new_fn().ok_or(MappingError::UnsupportedElement {
        type_name: info.name(),
        kind: info.kind().name(),
    })?;
    let columns = rows.columns()?;

    while rows.next_row() {
        let cells = rows.cells();
        if cells.len() != 1 {
            return Err(MappingError::ColumnCount {
                expected: cells.len(),
                actual: 1,
            }
            .into());
        }
        let scan_err = || {
            let name = columns.first().map_or("", |column| column.name());
            format!("scan error on column index 0, name {:?}", name)
        };

        let mut value = new();
        let scan = info
            .scan_fn()
            .ok_or(ScanError::Unsupported {
                from: cells[0].kind_name(),
                into: info.name(),
            })
            .wrap_err_with(scan_err)?;
        scan(value.as_mut(), &cells[0]).wrap_err_with(scan_err)?;
        dst.push_element(downcast::<T>(value)?);
    }
    rows.err()
}

/// Materializes every row through `plan`.
pub(crate) fn drive_records<T, D, R>(plan: &ScanPlan, dst: &mut D, rows: &mut R) -> Result<()>
where
    T: 'static,
    D: Destination<T> + ?Sized,
    R: RowStream + ?Sized,
{
    while rows.next_row() {
        let element = plan.materialize(rows.cells())?;
        dst.push_element(downcast::<T>(element)?);
    }
    rows.err()
}

/// Closes `rows` and merges the close outcome into `result`. An earlier error
/// always wins; the close failure it masks is logged.
pub(crate) fn finish<R: RowStream + ?Sized>(result: Result<()>, rows: &mut R) -> Result<()> {
    let closed = rows.close();
    match (result, closed) {
        (Ok(()), closed) => closed.wrap_err("failed to close row stream"),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            warn!(error = ?close_err, "failed to close row stream after mapping error");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::Reflect;
    use crate::rows::MemoryRows;
    use crate::types::{ColumnType, DataType, OwnedValue};

    fn ints(values: &[i64]) -> MemoryRows {
        MemoryRows::new(vec![ColumnType::new("n", DataType::Int8)])
            .with_rows(values.iter().map(|v| vec![OwnedValue::Int(*v)]))
    }

    #[test]
    fn scalars_are_appended_in_row_order() {
        let mut rows = ints(&[3, 1, 2]);
        let mut out: Vec<i64> = Vec::new();
        drive_scalars(&i64::type_info(), &mut out, &mut rows).unwrap();
        assert_eq!(out, vec![3, 1, 2]);
    }

    #[test]
    fn scalar_rows_need_exactly_one_cell() {
        let mut rows = MemoryRows::new(vec![
            ColumnType::new("a", DataType::Int8),
            ColumnType::new("b", DataType::Int8),
        ])
        .with_row(vec![OwnedValue::Int(1), OwnedValue::Int(2)]);
        let mut out: Vec<i64> = Vec::new();
        let err = drive_scalars(&i64::type_info(), &mut out, &mut rows).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MappingError>(),
            Some(&MappingError::ColumnCount {
                expected: 2,
                actual: 1
            })
        );
        assert!(out.is_empty());
    }

    #[test]
    fn stream_error_after_rows_keeps_prefix() {
        let mut rows = ints(&[1, 2, 3]).fail_after(2, "lost connection");
        let mut out: Vec<i64> = Vec::new();
        let err = drive_scalars(&i64::type_info(), &mut out, &mut rows).unwrap_err();
        assert_eq!(err.to_string(), "lost connection");
        assert_eq!(out, vec![1, 2]);
    }

    #[test]
    fn finish_prefers_the_original_error() {
        let mut rows = ints(&[]).fail_close("close failed");
        let err = finish(Err(eyre::eyre!("scan failed")), &mut rows).unwrap_err();
        assert_eq!(err.to_string(), "scan failed");
        assert!(rows.is_closed());
    }

    #[test]
    fn finish_reports_close_failure_on_success() {
        let mut rows = ints(&[]).fail_close("close failed");
        let err = finish(Ok(()), &mut rows).unwrap_err();
        assert_eq!(err.root_cause().to_string(), "close failed");

        let mut clean = ints(&[]);
        finish(Ok(()), &mut clean).unwrap();
        assert!(clean.is_closed());
    }
}
