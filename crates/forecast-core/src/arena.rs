use crate::error::ForecastError;
use crate::ForecastResult;

/// A pre-sized run of year slots (Year 0 through the horizon), each written
/// exactly once.
///
/// Reads go through `read_for`, which refuses to hand a year-`k` computation
/// anything recorded for a later year.
#[derive(Debug, Clone)]
pub struct YearSlots<T> {
    name: &'static str,
    slots: Vec<Option<T>>,
}

impl<T> YearSlots<T> {
    /// Slots for years `0..=horizon`.
    pub fn new(name: &'static str, horizon: usize) -> Self {
        let mut slots = Vec::with_capacity(horizon + 1);
        slots.resize_with(horizon + 1, || None);
        YearSlots { name, slots }
    }

    pub fn horizon(&self) -> usize {
        self.slots.len() - 1
    }

    pub fn is_finalized(&self, year: usize) -> bool {
        matches!(self.slots.get(year), Some(Some(_)))
    }

    /// Write the record for `year`. A second write to the same year fails.
    pub fn finalize(&mut self, year: usize, record: T) -> ForecastResult<()> {
        let name = self.name;
        let slot = self
            .slots
            .get_mut(year)
            .ok_or_else(|| violation(name, year, "year is outside the forecast horizon"))?;
        if slot.is_some() {
            return Err(violation(name, year, "slot already finalized"));
        }
        *slot = Some(record);
        Ok(())
    }

    /// Finalized record for `year`.
    pub fn get(&self, year: usize) -> ForecastResult<&T> {
        match self.slots.get(year) {
            Some(Some(record)) => Ok(record),
            Some(None) => Err(violation(self.name, year, "slot not yet finalized")),
            None => Err(violation(
                self.name,
                year,
                "year is outside the forecast horizon",
            )),
        }
    }

    /// Record for `year` as seen by a computation running in `reader_year`.
    pub fn read_for(&self, reader_year: usize, year: usize) -> ForecastResult<&T> {
        if year > reader_year {
            return Err(violation(
                self.name,
                year,
                &format!("year {reader_year} may not read a later year"),
            ));
        }
        self.get(year)
    }

    /// Every record, in year order. Fails if any slot was left empty.
    pub fn into_vec(self) -> ForecastResult<Vec<T>> {
        let name = self.name;
        self.slots
            .into_iter()
            .enumerate()
            .map(|(year, slot)| slot.ok_or_else(|| violation(name, year, "slot never finalized")))
            .collect()
    }
}

fn violation(schedule: &str, year: usize, reason: &str) -> ForecastError {
    ForecastError::SlotViolation {
        schedule: schedule.to_string(),
        year,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presized_to_horizon_plus_one() {
        let slots: YearSlots<u32> = YearSlots::new("test", 3);
        assert_eq!(slots.horizon(), 3);
        assert!(!slots.is_finalized(0));
    }

    #[test]
    fn test_write_once() {
        let mut slots = YearSlots::new("test", 2);
        slots.finalize(0, 10).unwrap();
        assert!(slots.finalize(0, 11).is_err());
        assert_eq!(*slots.get(0).unwrap(), 10);
    }

    #[test]
    fn test_cannot_read_later_year() {
        let mut slots = YearSlots::new("test", 2);
        slots.finalize(0, 1).unwrap();
        slots.finalize(1, 2).unwrap();
        assert!(slots.read_for(0, 1).is_err());
        assert_eq!(*slots.read_for(1, 0).unwrap(), 1);
    }

    #[test]
    fn test_unfinalized_read_fails() {
        let slots: YearSlots<u32> = YearSlots::new("test", 2);
        let err = slots.get(1).unwrap_err();
        assert!(matches!(err, ForecastError::SlotViolation { year: 1, .. }));
    }

    #[test]
    fn test_out_of_range_write_fails() {
        let mut slots = YearSlots::new("test", 1);
        assert!(slots.finalize(2, 0).is_err());
    }

    #[test]
    fn test_into_vec_requires_every_slot() {
        let mut slots = YearSlots::new("test", 1);
        slots.finalize(0, 'a').unwrap();
        assert!(slots.clone().into_vec().is_err());
        slots.finalize(1, 'b').unwrap();
        assert_eq!(slots.into_vec().unwrap(), vec!['a', 'b']);
    }
}
