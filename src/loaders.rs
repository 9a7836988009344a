//! Builds a [`TransportGraph`] from the two-table connections contract:
//! a transit-connections `DataFrame` (`from_stop_I, to_stop_I, dep_time_ut,
//! arr_time_ut, route_I`) and a walk-connections `DataFrame` (`from_stop_I,
//! to_stop_I, d_walk`). This is the already-reduced tabular form, not a raw
//! GTFS feed — no `stop_times.txt`/`trips.txt`/`calendar.txt` joins happen
//! here.

use polars::prelude::*;

use crate::graph::{Connection, TransportGraph, WalkConnection};
use crate::Error;

fn i64_column(df: &DataFrame, name: &str) -> Result<Vec<i64>, Error> {
    let series = df
        .column(name)
        .map_err(|_| Error::MissingColumn(name.to_string()))?
        .cast(&DataType::Int64)?;
    let chunked = series.i64()?;
    chunked
        .into_iter()
        .map(|opt| opt.ok_or_else(|| Error::MissingValue(name.to_string())))
        .collect()
}

fn str_column(df: &DataFrame, name: &str) -> Result<Vec<String>, Error> {
    let series = df
        .column(name)
        .map_err(|_| Error::MissingColumn(name.to_string()))?
        .cast(&DataType::String)?;
    let chunked = series.str()?;
    chunked
        .into_iter()
        .map(|opt| opt.map(str::to_string).ok_or_else(|| Error::MissingValue(name.to_string())))
        .collect()
}

/// Reads the transit and walk connection tables and builds a
/// [`TransportGraph`] from them, applying the same grouping and
/// dominance-pruning as [`TransportGraph::from_connections`].
pub fn from_dataframes(transit_df: &DataFrame, walk_df: &DataFrame) -> Result<TransportGraph, Error> {
    let from_stop = i64_column(transit_df, "from_stop_I")?;
    let to_stop = i64_column(transit_df, "to_stop_I")?;
    let dep_time = i64_column(transit_df, "dep_time_ut")?;
    let arr_time = i64_column(transit_df, "arr_time_ut")?;
    let route = str_column(transit_df, "route_I")?;

    let transit = from_stop
        .into_iter()
        .zip(to_stop)
        .zip(dep_time)
        .zip(arr_time)
        .zip(route)
        .map(|((((from_stop, to_stop), departure), arrival), route)| Connection {
            from_stop,
            to_stop,
            departure,
            arrival,
            route,
        })
        .collect::<Vec<_>>();

    let walk_from = i64_column(walk_df, "from_stop_I")?;
    let walk_to = i64_column(walk_df, "to_stop_I")?;
    let walk_duration = i64_column(walk_df, "d_walk")?;

    let walks = walk_from
        .into_iter()
        .zip(walk_to)
        .zip(walk_duration)
        .map(|((from_stop, to_stop), duration)| WalkConnection {
            from_stop,
            to_stop,
            duration,
        })
        .collect::<Vec<_>>();

    TransportGraph::from_connections(transit, walks)
}
