//! A tween composed of child tweens placed at start times.
//!
//! Children may overlap. When several overlapping children write the same property at the same
//! instant, the one that comes last in the direction of travel is applied last and wins: while
//! moving forward that is the child starting latest, while moving backward the child ending
//! earliest. The first update of an iteration has no direction of travel, it applies every child
//! so that the one active at the current time wins.

use std::{cmp::Ordering, fmt};

use anyhow::{Result, ensure};

use crate::{Easing, ExclusivityDirectory, TimeSource, Tween, TweenCore, TweenId};

struct TimelineChild {
    start_time: f64,
    end_time: f64,
    tween: Box<dyn Tween>,
}

impl TimelineChild {
    /// Half-open intersection of `[start_time, end_time)` with the window.
    fn intersects(&self, (from, to): (f64, f64)) -> bool {
        self.start_time < to && from < self.end_time
    }
}

impl fmt::Debug for TimelineChild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineChild")
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time)
            .field("id", self.tween.id())
            .finish()
    }
}

#[derive(Debug)]
pub struct Timeline {
    core: TweenCore,
    children: Vec<TimelineChild>,
    /// The time code of the previous update in the current iteration.
    previous_time_code: Option<f64>,
}

impl Timeline {
    pub fn builder() -> TimelineBuilder {
        TimelineBuilder::default()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Indices of the children to update for a move to `time_code`, in update order.
    fn update_order(&self, time_code: f64) -> Vec<usize> {
        let Some(previous) = self.previous_time_code else {
            return self.full_order(time_code);
        };

        let window = (previous.min(time_code), previous.max(time_code));
        let mut selected: Vec<usize> = (0..self.children.len())
            .filter(|&i| self.children[i].intersects(window))
            .collect();

        // Stable sorts, ties keep insertion order.
        if time_code >= previous {
            selected.sort_by(|&a, &b| {
                cmp_f64(self.children[a].start_time, self.children[b].start_time)
            });
        } else {
            selected
                .sort_by(|&a, &b| cmp_f64(self.children[b].end_time, self.children[a].end_time));
        }
        selected
    }

    /// All children, ordered so that the state at `time_code` wins.
    ///
    /// Children not yet started come first, latest start first, so each one's start value is
    /// overwritten by its predecessors. Started children follow by ascending start time.
    fn full_order(&self, time_code: f64) -> Vec<usize> {
        let (mut pending, mut started): (Vec<usize>, Vec<usize>) =
            (0..self.children.len()).partition(|&i| self.children[i].start_time > time_code);
        pending.sort_by(|&a, &b| cmp_f64(self.children[b].start_time, self.children[a].start_time));
        started.sort_by(|&a, &b| cmp_f64(self.children[a].start_time, self.children[b].start_time));
        pending.extend(started);
        pending
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

impl Tween for Timeline {
    fn core(&self) -> &TweenCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TweenCore {
        &mut self.core
    }

    fn apply_percent_complete(&mut self, ratio: f64) {
        let time_code = ratio * self.core.duration();
        for index in self.update_order(time_code) {
            let child = &mut self.children[index];
            child.tween.update(time_code - child.start_time);
        }
        self.previous_time_code = Some(time_code);
    }

    fn cancel(&mut self) {
        self.core.canceled().cancel();
        for child in &mut self.children {
            child.tween.cancel();
        }
    }

    fn set_time_source(&mut self, source: TimeSource) -> Result<()> {
        self.core.attach(source)?;
        for child in &mut self.children {
            child.tween.set_time_source(source)?;
        }
        Ok(())
    }

    fn time_source_start(&mut self, directory: &ExclusivityDirectory) {
        self.core.register(directory);
        for child in &mut self.children {
            child.tween.time_source_start(directory);
        }
    }

    fn time_source_stop(&mut self, directory: &ExclusivityDirectory) {
        self.core.unregister(directory);
        for child in &mut self.children {
            child.tween.time_source_stop(directory);
        }
    }

    fn loop_begin(&mut self) {
        // Every iteration starts with a full evaluation of all children.
        self.previous_time_code = None;
        self.core.loop_begin();
        for child in &mut self.children {
            child.tween.loop_begin();
        }
    }

    fn loop_end(&mut self) {
        self.core.loop_end();
        for child in &mut self.children {
            child.tween.loop_end();
        }
    }
}

/// Accumulates `(start_time, tween)` entries for a [`Timeline`].
pub struct TimelineBuilder {
    entries: Vec<(f64, Box<dyn Tween>)>,
    id: Option<TweenId>,
    easing: Easing,
}

impl Default for TimelineBuilder {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            id: None,
            easing: Easing::Linear,
        }
    }
}

impl fmt::Debug for TimelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineBuilder")
            .field("entries", &self.entries.len())
            .field("id", &self.id)
            .field("easing", &self.easing)
            .finish()
    }
}

impl TimelineBuilder {
    pub fn add(self, start_time: f64, tween: impl Tween + 'static) -> Self {
        self.add_boxed(start_time, Box::new(tween))
    }

    pub fn add_boxed(mut self, start_time: f64, tween: Box<dyn Tween>) -> Self {
        self.entries.push((start_time, tween));
        self
    }

    /// Add all `tweens` starting at the same time.
    pub fn parallel(
        mut self,
        start_time: f64,
        tweens: impl IntoIterator<Item = Box<dyn Tween>>,
    ) -> Self {
        for tween in tweens {
            self = self.add_boxed(start_time, tween);
        }
        self
    }

    /// Add `tweens` back to back, separated by `delay`.
    pub fn series(
        mut self,
        start_time: f64,
        delay: f64,
        tweens: impl IntoIterator<Item = Box<dyn Tween>>,
    ) -> Self {
        let mut next = start_time;
        for tween in tweens {
            let duration = tween.duration();
            self = self.add_boxed(next, tween);
            next += duration + delay;
        }
        self
    }

    /// The latest end time of all entries added so far.
    pub fn end_time(&self) -> f64 {
        self.entries
            .iter()
            .map(|(start, tween)| start + tween.duration())
            .fold(0.0, f64::max)
    }

    pub fn with_id(mut self, id: impl Into<TweenId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Easing of the timeline's own progress. Defaults to linear.
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn create(self) -> Result<Timeline> {
        let mut children = Vec::with_capacity(self.entries.len());
        for (start_time, tween) in self.entries {
            ensure!(
                start_time.is_finite() && start_time >= 0.0,
                "Timeline start time must be finite and not negative, got {start_time}"
            );
            children.push(TimelineChild {
                start_time,
                end_time: start_time + tween.duration(),
                tween,
            });
        }

        let duration = children
            .iter()
            .map(|child| child.end_time)
            .fold(0.0, f64::max);

        let mut timeline = Timeline {
            core: TweenCore::new(duration, self.easing)?,
            children,
            previous_time_code: None,
        };
        if let Some(id) = self.id {
            timeline = timeline.with_id(id);
        }
        Ok(timeline)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use approx::assert_abs_diff_eq;
    use futures::FutureExt;

    use super::*;
    use crate::{
        AnimationContext, BasicTween, BoundInterpolator, Clock, ClockConfig, Property, SharedValue,
        Ticker,
    };

    type Log = Arc<Mutex<Vec<(&'static str, f64)>>>;

    /// A linear child that logs `(name, local ratio)` on every apply.
    fn logged(log: &Log, name: &'static str, duration: f64) -> Box<dyn Tween> {
        let log = log.clone();
        Box::new(
            BasicTween::new(duration, Easing::Linear, move |ratio| {
                log.lock().push((name, ratio))
            })
            .unwrap(),
        )
    }

    fn names(log: &Log) -> Vec<&'static str> {
        log.lock().drain(..).map(|(name, _)| name).collect()
    }

    #[test]
    fn duration_is_the_latest_end_time() {
        let log = Log::default();
        let timeline = Timeline::builder()
            .add_boxed(0.0, logged(&log, "a", 1.0))
            .add_boxed(2.0, logged(&log, "b", 3.0))
            .create()
            .unwrap();
        assert_eq!(timeline.duration(), 5.0);
    }

    #[test]
    fn empty_timeline_has_zero_duration() {
        let timeline = Timeline::builder().create().unwrap();
        assert_eq!(timeline.duration(), 0.0);
        assert_eq!(timeline.child_count(), 0);
    }

    #[test]
    fn invalid_start_time_fails() {
        let log = Log::default();
        let result = Timeline::builder()
            .add_boxed(f64::NAN, logged(&log, "a", 1.0))
            .create();
        assert!(result.is_err());
    }

    #[test]
    fn series_places_tweens_back_to_back() {
        let log = Log::default();
        let builder = Timeline::builder().series(
            1.0,
            0.5,
            [logged(&log, "a", 1.0), logged(&log, "b", 2.0)],
        );
        // a: [1, 2), b: [2.5, 4.5)
        assert_eq!(builder.end_time(), 4.5);
        assert_eq!(builder.create().unwrap().duration(), 4.5);
    }

    #[test]
    fn parallel_starts_tweens_together() {
        let log = Log::default();
        let timeline = Timeline::builder()
            .parallel(0.5, [logged(&log, "a", 1.0), logged(&log, "b", 2.0)])
            .create()
            .unwrap();
        assert_eq!(timeline.duration(), 2.5);
    }

    #[test]
    fn first_update_touches_all_children() {
        let log = Log::default();
        let mut timeline = Timeline::builder()
            .add_boxed(0.0, logged(&log, "a", 1.0))
            .add_boxed(3.0, logged(&log, "b", 1.0))
            .create()
            .unwrap();

        timeline.update(0.0);
        assert_eq!(
            *log.lock(),
            vec![("b", 0.0), ("a", 0.0)],
            "b is clamped to its local start and applied first"
        );
    }

    #[test]
    fn first_update_applies_the_active_child_last() {
        let log = Log::default();
        let mut timeline = Timeline::builder()
            .add_boxed(0.0, logged(&log, "a", 1.0))
            .add_boxed(1.0, logged(&log, "b", 1.0))
            .add_boxed(2.0, logged(&log, "c", 1.0))
            .create()
            .unwrap();

        timeline.update(1.5);
        assert_eq!(names(&log), ["c", "a", "b"]);
    }

    #[test]
    fn series_on_one_property_starts_without_a_jump() {
        let ticker = Ticker::new();
        let context = AnimationContext::new("host", ExclusivityDirectory::new());
        context.activate(ticker.clone());

        let value = SharedValue::new(0.0);
        let segment = |from: f64, to: f64| {
            BasicTween::property(
                value.clone(),
                BoundInterpolator::new(from, to),
                1.0,
                Easing::Linear,
            )
            .unwrap()
        };
        let timeline = Timeline::builder()
            .add(0.0, segment(0.0, 10.0))
            .add(1.0, segment(10.0, 20.0))
            .create()
            .unwrap();
        let clock = Clock::new(timeline, ClockConfig::default().with_iterations(2)).unwrap();
        let mut completion = clock.start(&context);

        let mut values = Vec::new();
        for _ in 0..3 {
            ticker.update(0.1);
            values.push(value.get());
        }
        for (value, expected) in values.into_iter().zip([1.0, 2.0, 3.0]) {
            assert_abs_diff_eq!(value, expected, epsilon = 1e-9);
        }

        // Into the second iteration.
        ticker.update(2.0);
        ticker.update(0.1);
        assert_abs_diff_eq!(value.get(), 1.0, epsilon = 1e-9);
        assert!((&mut completion).now_or_never().is_none());
    }

    #[test]
    fn later_updates_only_touch_children_in_the_window() {
        let log = Log::default();
        let mut timeline = Timeline::builder()
            .add_boxed(0.0, logged(&log, "a", 1.0))
            .add_boxed(3.0, logged(&log, "b", 1.0))
            .create()
            .unwrap();

        timeline.update(0.0);
        log.lock().clear();
        timeline.update(0.5);
        assert_eq!(names(&log), ["a"]);
        // Crossing a's end finishes it.
        timeline.update(2.0);
        assert_eq!(*log.lock(), vec![("a", 1.0)]);
    }

    #[test]
    fn overlapping_children_resolve_by_direction() {
        let log = Log::default();
        let mut timeline = Timeline::builder()
            .add_boxed(0.0, logged(&log, "A", 2.0))
            .add_boxed(1.0, logged(&log, "B", 2.0))
            .create()
            .unwrap();

        timeline.update(0.0);
        log.lock().clear();

        timeline.update(1.5);
        assert_eq!(names(&log), ["A", "B"], "forward: later start applied last");

        timeline.update(0.0);
        assert_eq!(names(&log), ["B", "A"], "backward: earlier end applied last");
    }

    #[test]
    fn children_receive_local_time() {
        let log = Log::default();
        let mut timeline = Timeline::builder()
            .add_boxed(2.0, logged(&log, "a", 2.0))
            .create()
            .unwrap();

        timeline.update(0.0);
        log.lock().clear();
        timeline.update(3.0);
        assert_eq!(*log.lock(), vec![("a", 0.5)]);
    }

    #[test]
    fn loop_begin_resets_the_window() {
        let log = Log::default();
        let mut timeline = Timeline::builder()
            .add_boxed(0.0, logged(&log, "a", 1.0))
            .add_boxed(3.0, logged(&log, "b", 1.0))
            .create()
            .unwrap();

        timeline.update(0.0);
        timeline.update(0.5);
        log.lock().clear();

        timeline.loop_begin();
        timeline.update(0.5);
        assert_eq!(names(&log), ["b", "a"]);
    }

    #[test]
    fn time_source_and_directory_fan_out() {
        let log = Log::default();
        let child = BasicTween::new(1.0, Easing::Linear, |_| {})
            .unwrap()
            .with_id("child");
        let mut timeline = Timeline::builder()
            .add(0.0, child)
            .add_boxed(0.0, logged(&log, "other", 1.0))
            .with_id("parent")
            .create()
            .unwrap();

        let source = TimeSource::new();
        timeline.set_time_source(source).unwrap();
        let directory = ExclusivityDirectory::new();
        timeline.time_source_start(&directory);

        assert_eq!(directory.owner(&"parent".into()), Some(source));
        assert_eq!(directory.owner(&"child".into()), Some(source));

        timeline.time_source_stop(&directory);
        assert!(directory.is_empty());
    }

    #[test]
    fn cancel_reaches_children() {
        let log = Log::default();
        let child = logged(&log, "a", 1.0);
        let token = child.cancel_token();
        let mut timeline = Timeline::builder().add_boxed(0.0, child).create().unwrap();

        timeline.cancel();
        assert!(token.is_canceled());
        timeline.update(0.5);
        assert!(log.lock().is_empty());
    }
}
