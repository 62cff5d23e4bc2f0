use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use approx::assert_relative_eq;
use sunsize_components::{
    financial::{FinancialConfig, Payback, TariffPolicy},
    irradiance::{IrradianceSource, ProfileOrigin, SolarResource, SourceError},
    request::{Field, InvalidReason, RawRequest, SizingRequest},
};
use sunsize_core::Model;
use sunsize_engine::{EngineConfig, Recovery, SizingEngine, SizingError};
use uom::si::{area::square_meter, power::kilowatt};

fn engine() -> SizingEngine {
    SizingEngine::with_builtin_data(EngineConfig::default()).unwrap()
}

fn new_york() -> RawRequest {
    RawRequest::new("9000", "120", "45", "40.7128", "-74.0060")
}

/// Counts fetches and reports no data, so lookups fall through to the table.
#[derive(Default)]
struct CountingSource {
    calls: AtomicUsize,
}

impl IrradianceSource for CountingSource {
    fn fetch(&self, _: f64, _: f64) -> Result<Option<SolarResource>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}

#[test]
fn new_york_reference_case() {
    let result = engine().size(&new_york()).unwrap();

    assert_eq!(result.irradiance.origin, ProfileOrigin::Table);
    assert_relative_eq!(result.irradiance.peak_sun_hours(), 4.2436, epsilon = 1e-9);
    assert_relative_eq!(result.irradiance.derating(), 0.8114, epsilon = 1e-9);

    let expected_kw = 9000.0 / (4.2436 * 365.0 * 0.8114);
    assert_relative_eq!(
        result.required_capacity.get::<kilowatt>(),
        expected_kw,
        max_relative = 1e-9
    );

    let layout = result.layout;
    assert_eq!(layout.panel_count, 18);
    assert_eq!((layout.series_count, layout.parallel_count), (9, 2));
    assert_relative_eq!(layout.system_size.get::<kilowatt>(), 7.2, epsilon = 1e-12);
    assert!(layout.total_area.get::<square_meter>() <= 45.0);

    assert_eq!(result.panel.model, "CS3W-400P");
    assert_eq!(result.inverter.model, "Sunny Boy 7.7-US");

    let financial = result.financial;
    assert_relative_eq!(financial.tariff_usd_per_kwh, 0.16, epsilon = 1e-12);
    assert_relative_eq!(financial.total_cost_usd, 16_860.0, epsilon = 1e-9);
    // Production slightly exceeds consumption, so savings are capped.
    assert_relative_eq!(financial.annual_savings_usd, 1440.0, epsilon = 1e-9);
    assert_relative_eq!(
        financial.payback.years().unwrap(),
        16_860.0 / 1440.0,
        epsilon = 1e-9
    );
    assert_relative_eq!(
        financial.roi_25_years,
        (1440.0 * 25.0 - 16_860.0) / 16_860.0,
        epsilon = 1e-12
    );

    assert!(result.performance.offset_percent > 100.0);
}

#[test]
fn result_serializes_in_display_units() {
    let result = engine().size(&new_york()).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_relative_eq!(json["layout"]["system_size_kw"].as_f64().unwrap(), 7.2, epsilon = 1e-9);
    assert_eq!(json["layout"]["panel_count"], 18);
    assert_eq!(json["irradiance"]["origin"], "table");
    assert_relative_eq!(json["panel"]["power_w"].as_f64().unwrap(), 400.0);
    assert_relative_eq!(
        json["financial"]["payback"]["years"].as_f64().unwrap(),
        16_860.0 / 1440.0,
        epsilon = 1e-9
    );

    let summary = result.to_string();
    assert!(summary.starts_with("7.20 kW system: 18 panels (9 in series x 2 in parallel)"));
}

#[test]
fn layout_invariants_hold_across_requests() {
    let engine = engine();
    let cases = [
        ("4000", "60", "30", "33.4484", "-112.0740"),
        ("9000", "120", "45", "40.7128", "-74.0060"),
        ("12000", "210", "80", "43.6150", "-116.2023"),
        ("2500", "35", "12", "39.7392", "-104.9903"),
        ("15000", "260", "120", "32.7767", "-96.7970"),
    ];

    for (consumption, bill, area, lat, lng) in cases {
        let result = engine
            .size(&RawRequest::new(consumption, bill, area, lat, lng))
            .unwrap();
        let layout = result.layout;
        let available: f64 = area.parse().unwrap();

        assert_eq!(layout.series_count * layout.parallel_count, layout.panel_count);
        assert!(layout.total_area.get::<square_meter>() <= available);
        assert!(layout.system_size >= result.required_capacity);
        assert!(result.inverter.rated_power >= layout.system_size);
        assert!(
            result.panel.open_circuit_voltage * layout.series_count as f64
                <= result.inverter.max_input_voltage
        );
        assert!(
            result.panel.short_circuit_current * layout.parallel_count as f64
                <= result.inverter.max_input_current
        );
    }
}

#[test]
fn system_size_grows_with_consumption() {
    let engine = engine();
    let mut previous = 0.0;

    for consumption in (1..=40).map(|i| f64::from(i) * 500.0) {
        let request = SizingRequest::new(consumption, 150.0, 200.0, 40.7128, -74.0060).unwrap();
        let size = engine
            .size_request(&request)
            .unwrap()
            .layout
            .system_size
            .get::<kilowatt>();
        assert!(size > 0.0);
        assert!(size >= previous, "{consumption} kWh gave {size} kW after {previous} kW");
        previous = size;
    }
}

#[test]
fn tiny_roof_is_area_insufficient() {
    let error = engine()
        .size(&new_york().with(Field::AvailableArea, "1"))
        .unwrap_err();

    let SizingError::AreaInsufficient(ref details) = error else {
        panic!("expected AreaInsufficient, got {error:?}");
    };
    assert_eq!(details.max_panels, 0);
    assert_eq!(details.required_panels, 18);
    assert_eq!(error.recovery(), Recovery::AdjustConstraints);
}

#[test]
fn huge_roof_sizes_like_a_large_one() {
    let engine = engine();
    let huge = engine
        .size(&new_york().with(Field::AvailableArea, "1e20"))
        .unwrap();
    let large = engine
        .size(&new_york().with(Field::AvailableArea, "1000"))
        .unwrap();
    assert_eq!(huge.layout, large.layout);
    assert_eq!(huge.layout.panel_count, 18);
}

#[test]
fn out_of_range_coordinates_fail_before_lookup() {
    let source = Arc::new(CountingSource::default());
    let engine = engine().with_source(source.clone());

    let error = engine
        .size(&new_york().with(Field::Latitude, "95"))
        .unwrap_err();
    assert!(matches!(
        &error,
        SizingError::InvalidInput(e)
            if e.field == Field::Latitude
                && e.reason == InvalidReason::OutOfRange { min: -90.0, max: 90.0 }
    ));
    assert_eq!(error.recovery(), Recovery::CorrectField(Field::Latitude));

    let error = engine
        .size(&new_york().with(Field::Longitude, 200.0))
        .unwrap_err();
    assert_eq!(error.recovery(), Recovery::CorrectField(Field::Longitude));

    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    assert_eq!(engine.irradiance().cached_cells(), 0);
}

#[test]
fn unresolved_location() {
    let error = engine()
        .size(&RawRequest::new("9000", "120", "45", "-33.8688", "151.2093"))
        .unwrap_err();
    assert!(matches!(error, SizingError::LocationUnresolved(_)));
    assert_eq!(error.recovery(), Recovery::AdjustCoordinates);
}

#[test]
fn zero_tariff_has_no_payback() {
    let config = EngineConfig {
        financial: FinancialConfig {
            tariff: TariffPolicy::Fixed { usd_per_kwh: 0.0 },
            ..FinancialConfig::default()
        },
        ..EngineConfig::default()
    };
    let engine = SizingEngine::with_builtin_data(config).unwrap();

    let financial = engine.size(&new_york()).unwrap().financial;
    assert_eq!(financial.payback, Payback::Never);
    assert_eq!(financial.payback.to_string(), "no payback");
    assert!(!financial.roi_25_years.is_nan());
    assert!(!financial.annual_savings_usd.is_nan());
}

#[test]
fn very_large_consumption_needs_a_professional() {
    let error = engine()
        .size(&RawRequest::new("2000000", "30000", "100000", "40.7", "-74.0"))
        .unwrap_err();
    assert!(matches!(error, SizingError::InfeasibleCapacity(_)));
    assert_eq!(error.recovery(), Recovery::ContactProfessional);
}

#[test]
fn batch_preserves_order_and_matches_single_runs() {
    let engine = engine();
    let requests = vec![
        new_york(),
        new_york().with(Field::AvailableArea, "1"),
        RawRequest::new("6000", "80", "40", "33.4", "-112.1"),
        new_york().with(Field::MonthlyBill, "abc"),
    ];

    let results = engine.size_batch(&requests);
    assert_eq!(results.len(), requests.len());

    assert_eq!(results[0].as_ref().unwrap(), &engine.size(&requests[0]).unwrap());
    assert!(matches!(results[1], Err(SizingError::AreaInsufficient(_))));
    assert_eq!(results[2].as_ref().unwrap(), &engine.call(&requests[2]).unwrap());
    assert!(matches!(
        &results[3],
        Err(SizingError::InvalidInput(e)) if e.field == Field::MonthlyBill
    ));
}
