use crate::{
    compute::{normalize_for_timeseries, parse_decimal},
    data::{Error, RecordSet, AMOUNT, BALANCE},
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ChartKind {
    Line,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Colour {
    Blue,
    Red,
    Black,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Point {
    pub date: NaiveDateTime,
    pub value: Decimal,
    pub colour: Colour,
}

/// A chart is nothing more than its labels and its points in date order; how
/// it ends up on screen (or on disk) is the business of a `ChartSink`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Chart {
    pub title: &'static str,
    pub y_label: &'static str,
    pub kind: ChartKind,
    pub points: Vec<Point>,
}

/// Where charts get drawn. It's handed to whoever draws, there is no shared
/// canvas, so several charts can go to the same sink (or to a mock in tests).
pub(crate) trait ChartSink {
    fn draw(&mut self, chart: &Chart) -> Result<(), Error>;
}

/// Account balance over time, one point per dated row, as a line.
pub(crate) fn balance_chart(records: &RecordSet) -> Result<Chart, Error> {
    let points = points(records, BALANCE, |_| Colour::Blue)?;
    Ok(Chart {
        title: "Account Balance Over Time",
        y_label: "Balance (CAD)",
        kind: ChartKind::Line,
        points,
    })
}

/// Transaction amounts over time as bars, money going out in red.
pub(crate) fn amount_chart(records: &RecordSet) -> Result<Chart, Error> {
    let points = points(records, AMOUNT, |value| {
        if value < Decimal::ZERO {
            Colour::Red
        } else {
            Colour::Black
        }
    })?;
    Ok(Chart {
        title: "Transaction Amounts Over Time",
        y_label: "Amount (CAD)",
        kind: ChartKind::Bar,
        points,
    })
}

fn points(
    records: &RecordSet,
    column: &'static str,
    colour: impl Fn(Decimal) -> Colour,
) -> Result<Vec<Point>, Error> {
    let series = normalize_for_timeseries(records)?;
    let mut points = Vec::with_capacity(series.len());
    for (row, date, raw) in series.column(column)? {
        // blank cells leave a gap in the series
        if let Some(value) = parse_decimal(column, row, raw)? {
            points.push(Point {
                date,
                value,
                colour: colour(value),
            });
        }
    }
    Ok(points)
}

#[derive(Serialize)]
struct ChartRow<'a> {
    chart: &'a str,
    y_label: &'a str,
    kind: ChartKind,
    date: String,
    value: Decimal,
    colour: Colour,
}

/// Basic CSV exporter for charts: one row per point, tagged with the chart
/// title and axis label, so any plotting tool can pick the series up.
pub(crate) struct CsvChartSink<W: std::io::Write> {
    wtr: csv::Writer<W>,
}

impl<W: std::io::Write> CsvChartSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            wtr: csv::Writer::from_writer(writer),
        }
    }

    /// Flushes what was drawn and hands the writer back.
    pub fn finish(self) -> Result<W, Error> {
        self.wtr
            .into_inner()
            .map_err(|e| Error::from(csv::Error::from(e.into_error())))
    }
}

impl<W: std::io::Write> ChartSink for CsvChartSink<W> {
    fn draw(&mut self, chart: &Chart) -> Result<(), Error> {
        for point in &chart.points {
            self.wtr.serialize(ChartRow {
                chart: chart.title,
                y_label: chart.y_label,
                kind: chart.kind,
                date: point.date.format("%Y-%m-%d %H:%M:%S").to_string(),
                value: point.value,
                colour: point.colour,
            })?;
        }
        Ok(())
    }
}
