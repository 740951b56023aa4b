use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use meteocast::{
    BoxError, ChannelSubscriber, Condition, EventKind, EventPayload, EventSource, ExtremeKind, ExtremeLimits,
    FieldThresholds, MeasurementProducer, Measurements, ProducerConfig, RegistryHooks, Subscriber, SubscriberFault,
};

fn zeroed_config(threshold: f64) -> ProducerConfig {
    ProducerConfig {
        location: "Lab".to_string(),
        initial: Measurements::new(0.0, 0.0, 0.0),
        thresholds: FieldThresholds::uniform(threshold),
        ..ProducerConfig::default()
    }
}

fn drain_kinds(stream: &meteocast::NotificationStream) -> Vec<EventKind> {
    stream.try_iter().map(|n| n.kind).collect()
}

#[test]
fn threshold_gating_uses_strict_comparison() {
    let producer = MeasurementProducer::new(zeroed_config(1.0)).unwrap();
    let (sub, stream) = ChannelSubscriber::channel("temps", [EventKind::TemperatureChanged], 16);
    producer.register(sub);

    producer.update_measurements(Measurements::new(0.5, 0.0, 0.0)).unwrap();
    assert!(drain_kinds(&stream).is_empty());

    // stored value is now 0.5; 1.5 is exactly 1.0 away
    producer.update_measurements(Measurements::new(1.5, 0.0, 0.0)).unwrap();
    assert!(drain_kinds(&stream).is_empty());

    let producer = MeasurementProducer::new(zeroed_config(1.0)).unwrap();
    let (sub, stream) = ChannelSubscriber::channel("temps", [EventKind::TemperatureChanged], 16);
    producer.register(sub);

    producer.update_measurements(Measurements::new(1.0, 0.0, 0.0)).unwrap();
    assert!(drain_kinds(&stream).is_empty());

    let producer = MeasurementProducer::new(zeroed_config(1.0)).unwrap();
    let (sub, stream) = ChannelSubscriber::channel("temps", [EventKind::TemperatureChanged], 16);
    producer.register(sub);

    producer.update_measurements(Measurements::new(1.5, 0.0, 0.0)).unwrap();
    let got = stream.recv_timeout(Duration::from_millis(100)).unwrap();
    assert_eq!(got.kind, EventKind::TemperatureChanged);
    assert_eq!(got.payload.as_scalar(), Some(1.5));
}

#[test]
fn every_update_emits_exactly_one_heartbeat() {
    let producer = MeasurementProducer::for_location("Beijing").unwrap();
    let (sub, stream) = ChannelSubscriber::channel("beats", [EventKind::MeasurementsChanged], 64);
    producer.register(sub);
    assert_eq!(drain_kinds(&stream).len(), 1, "initial push on registration");

    let readings = [
        Measurements::new(25.0, 65.0, 1013.1),
        Measurements::new(25.0, 65.0, 1013.1),
        Measurements::new(28.0, 70.0, 1012.0),
        Measurements::new(28.01, 70.2, 1012.3),
    ];
    for r in readings {
        producer.update_measurements(r).unwrap();
        assert_eq!(drain_kinds(&stream), vec![EventKind::MeasurementsChanged]);
    }
}

#[test]
fn extreme_alert_names_only_configured_predicates() {
    let cfg = ProducerConfig {
        location: "Desert".to_string(),
        extreme_limits: ExtremeLimits {
            heat_above: Some(40.0),
            pressure_below: Some(980.0),
            ..ExtremeLimits::none()
        },
        ..ProducerConfig::default()
    };
    let producer = MeasurementProducer::new(cfg).unwrap();
    let (sub, stream) = ChannelSubscriber::channel("alerts", [EventKind::ExtremeWeather], 8);
    producer.register(sub);

    producer.update_measurements(Measurements::new(45.0, 95.0, 970.0)).unwrap();

    let alerts: Vec<_> = stream.try_iter().collect();
    assert_eq!(alerts.len(), 1);
    let alert = alerts[0].payload.as_alert().unwrap();
    assert!(alert.message.contains("temperature"));
    assert!(alert.message.contains("pressure"));
    assert!(!alert.message.contains("humidity"));
    assert_eq!(alert.triggered.len(), 2);
    assert!(alert.has(ExtremeKind::ExtremeHeat));
    assert!(alert.has(ExtremeKind::VeryLowPressure));
}

#[test]
fn late_joiner_receives_current_snapshot_alone() {
    let producer = MeasurementProducer::for_location("Shanghai").unwrap();
    let (early, early_stream) = ChannelSubscriber::channel("early", [], 64);
    producer.register(early);

    producer.update_measurements(Measurements::new(18.0, 40.0, 1025.0)).unwrap();
    producer.update_measurements(Measurements::new(22.0, 45.0, 1008.0)).unwrap();
    let early_before: Vec<_> = early_stream.try_iter().collect();

    let (late, late_stream) = ChannelSubscriber::channel("late", [], 64);
    producer.register(late);

    let pushed: Vec<_> = late_stream.try_iter().collect();
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].kind, EventKind::MeasurementsChanged);
    let sample = pushed[0].payload.as_sample().unwrap();
    assert_eq!(sample.measurements(), Measurements::new(22.0, 45.0, 1008.0));
    assert_eq!(sample.condition, Condition::Mild);
    assert_eq!(sample.location, "Shanghai");

    // the early subscriber saw nothing from the late registration
    assert!(early_stream.is_empty());
    assert!(!early_before.is_empty());

    producer.update_measurements(Measurements::new(22.0, 45.0, 1008.0)).unwrap();
    assert_eq!(drain_kinds(&late_stream), vec![EventKind::MeasurementsChanged]);
}

#[derive(Default)]
struct CountingHooks {
    faults: Mutex<Vec<SubscriberFault>>,
}

impl RegistryHooks for CountingHooks {
    fn on_subscriber_error(&self, _subscriber: &Arc<dyn Subscriber>, fault: &SubscriberFault) {
        self.faults.lock().unwrap().push(fault.clone());
    }
}

struct Grumpy;

impl Subscriber for Grumpy {
    fn name(&self) -> &str {
        "grumpy"
    }

    fn receive(&self, _source: &EventSource, _kind: EventKind, _payload: &EventPayload) -> Result<(), BoxError> {
        Err("not today".into())
    }
}

#[test]
fn failing_initial_push_does_not_roll_back_registration() {
    let hooks = Arc::new(CountingHooks::default());
    let producer = MeasurementProducer::with_hooks(ProducerConfig::for_location("Ridge"), hooks.clone()).unwrap();

    let grumpy = Arc::new(Grumpy);
    assert!(producer.register(grumpy.clone()));
    assert_eq!(producer.subscriber_count(), 1);

    let faults = hooks.faults.lock().unwrap().clone();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].kind(), EventKind::MeasurementsChanged);
    assert_eq!(faults[0].subscriber(), "grumpy");
}

#[test]
fn subscriber_faults_never_reach_the_producer_caller() {
    let hooks = Arc::new(CountingHooks::default());
    let producer = MeasurementProducer::with_hooks(ProducerConfig::for_location("Ridge"), hooks.clone()).unwrap();
    producer.register(Arc::new(Grumpy));
    let (sub, stream) = ChannelSubscriber::channel("ok", [], 64);
    producer.register(sub);
    stream.try_iter().for_each(drop);

    let outcome = producer.update_measurements(Measurements::new(45.0, 50.0, 1013.0)).unwrap();

    // grumpy faults once per pass; the healthy subscriber sees every pass
    assert_eq!(drain_kinds(&stream).len(), outcome.notifications);
    assert_eq!(hooks.faults.lock().unwrap().len(), 1 + outcome.notifications);
}

#[test]
fn condition_changes_are_broadcast_with_new_label() {
    let producer = MeasurementProducer::for_location("Coast").unwrap();
    let (sub, stream) = ChannelSubscriber::channel("weather", [EventKind::WeatherChanged], 16);
    producer.register(sub);

    producer.update_measurements(Measurements::new(25.0, 85.0, 1010.0)).unwrap();
    producer.update_measurements(Measurements::new(25.5, 86.0, 1010.0)).unwrap();
    producer.update_measurements(Measurements::new(-5.0, 50.0, 1010.0)).unwrap();

    let labels: Vec<_> = stream.try_iter().filter_map(|n| n.payload.as_condition()).collect();
    assert_eq!(labels, vec![Condition::Humid, Condition::Freezing]);
    assert_eq!(producer.condition(), Condition::Freezing);
}

#[test]
fn config_loaded_from_json_drives_the_producer() {
    let cfg = ProducerConfig::from_json_str(
        r#"{ "location": "Pier 9", "thresholds": { "temperature": 5.0, "humidity": 5.0, "pressure": 5.0 } }"#,
    )
    .unwrap();
    let producer = MeasurementProducer::new(cfg).unwrap();

    let outcome = producer.update_measurements(Measurements::new(4.0, 4.0, 1013.25)).unwrap();
    assert!(outcome.changed.is_empty());
    assert_eq!(outcome.sample.location, "Pier 9");
}

/// Blocks inside the first WEATHER_CHANGED it receives until released.
struct Parker {
    parked: Mutex<Option<mpsc::Sender<()>>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl Subscriber for Parker {
    fn name(&self) -> &str {
        "parker"
    }

    fn receive(&self, _source: &EventSource, kind: EventKind, _payload: &EventPayload) -> Result<(), BoxError> {
        if kind == EventKind::WeatherChanged {
            if let Some(parked) = self.parked.lock().unwrap().take() {
                parked.send(()).unwrap();
                let _ = self.release.lock().unwrap().recv_timeout(Duration::from_secs(5));
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct Journal {
    seen: Mutex<Vec<(EventKind, EventPayload)>>,
}

impl Subscriber for Journal {
    fn name(&self) -> &str {
        "journal"
    }

    fn receive(&self, _source: &EventSource, kind: EventKind, payload: &EventPayload) -> Result<(), BoxError> {
        self.seen.lock().unwrap().push((kind, payload.clone()));
        Ok(())
    }
}

#[test]
fn late_joiner_push_precedes_broadcasts_of_an_in_flight_update() {
    let producer = Arc::new(MeasurementProducer::for_location("Fence").unwrap());
    let (parked_tx, parked_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    producer.register(Arc::new(Parker {
        parked: Mutex::new(Some(parked_tx)),
        release: Mutex::new(release_rx),
    }));

    let updater = {
        let producer = Arc::clone(&producer);
        thread::spawn(move || producer.update_measurements(Measurements::new(25.0, 65.0, 1013.0)).unwrap())
    };
    parked_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    let late = Arc::new(Journal::default());
    let joiner = {
        let producer = Arc::clone(&producer);
        let late = Arc::clone(&late);
        thread::spawn(move || producer.register(late))
    };

    // the update is still mid-sequence; registration has to wait it out
    thread::sleep(Duration::from_millis(50));
    assert!(late.seen.lock().unwrap().is_empty());

    release_tx.send(()).unwrap();
    let outcome = updater.join().unwrap();
    assert!(joiner.join().unwrap());

    let seen = late.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1, "late joiner saw {:?}", seen.iter().map(|(k, _)| *k).collect::<Vec<_>>());
    assert_eq!(seen[0].0, EventKind::MeasurementsChanged);
    assert_eq!(
        seen[0].1.as_sample().unwrap().measurements(),
        outcome.sample.measurements()
    );
}
