//! Property tests for the EEPROM emulator, run against both simulated
//! controller families

use proptest::collection::vec;
use proptest::prelude::*;

use eeflash_core::{Eeprom, EepromConfig, Flash, FlashDriver, Poll};
use eeflash_hal_samd::sim::SimBus;
use eeflash_hal_samd::AnyNvm;

const LENGTH: usize = 512;

type SimEeprom = Eeprom<FlashDriver<AnyNvm<SimBus>>, LENGTH>;

fn open(bus: SimBus) -> (SimEeprom, EepromConfig) {
    let driver = FlashDriver::new(AnyNvm::detect(bus, Poll::bounded(100)).unwrap());
    let config = EepromConfig::reserve_top(&driver.geometry(), LENGTH as u32).unwrap();
    let (region, flag) = config.validate(&driver.geometry()).unwrap();

    let mut eeprom = Eeprom::new(driver);
    eeprom.bind(region, flag).unwrap();
    (eeprom, config)
}

fn close(eeprom: SimEeprom) -> SimBus {
    eeprom.into_flash().free().free()
}

fn sim(samd51: bool) -> SimBus {
    if samd51 {
        SimBus::samd51()
    } else {
        SimBus::samd21()
    }
}

fn updates() -> impl Strategy<Value = Vec<(usize, u8)>> {
    vec((0usize..600, any::<u8>()), 0..200)
}

/// Expected image after applying `updates` to an erased EEPROM
fn model(updates: &[(usize, u8)]) -> [u8; LENGTH] {
    let mut image = [0xFF; LENGTH];
    for &(index, value) in updates {
        if let Some(byte) = image.get_mut(index) {
            *byte = value;
        }
    }
    image
}

proptest! {
    #[test]
    fn updates_read_back_without_touching_flash(
        updates in updates(),
        samd51 in any::<bool>(),
    ) {
        let (mut eeprom, _) = open(sim(samd51));
        for &(index, value) in &updates {
            eeprom.update(index, value);
        }
        let expected = model(&updates);
        for (index, &value) in expected.iter().enumerate() {
            prop_assert_eq!(eeprom.read(index), value);
        }
        prop_assert_eq!(eeprom.read(LENGTH), 0);
        prop_assert_eq!(eeprom.is_dirty(), expected.iter().any(|&b| b != 0xFF));

        let bus = close(eeprom);
        prop_assert_eq!(bus.erase_count(), 0);
        prop_assert_eq!(bus.page_write_count(), 0);
    }

    #[test]
    fn commit_then_rebind_reproduces_image(
        updates in updates(),
        samd51 in any::<bool>(),
    ) {
        let (mut eeprom, config) = open(sim(samd51));
        for &(index, value) in &updates {
            eeprom.update(index, value);
        }
        let dirty = eeprom.is_dirty();
        eeprom.commit().unwrap();
        prop_assert!(!eeprom.is_dirty());
        prop_assert_eq!(eeprom.is_valid(), dirty);

        let bus = close(eeprom);
        prop_assert_eq!(bus.violations().count(), 0);
        let start = config.region_address as usize;
        prop_assert_eq!(&bus.flash()[start..start + LENGTH], &model(&updates)[..]);

        let (eeprom, _) = open(bus);
        let mut image = [0u8; LENGTH];
        eeprom.read_bytes(0, &mut image);
        prop_assert_eq!(image, model(&updates));
    }

    #[test]
    fn each_dirty_commit_erases_once(
        batches in vec(updates(), 1..6),
        samd51 in any::<bool>(),
    ) {
        let (mut eeprom, _) = open(sim(samd51));
        let rows_per_commit = LENGTH.div_ceil(eeprom.flash().geometry().row_size as usize);
        let mut dirty_commits = 0;
        for batch in &batches {
            for &(index, value) in batch {
                eeprom.update(index, value);
            }
            if eeprom.is_dirty() {
                dirty_commits += 1;
            }
            eeprom.commit().unwrap();
            eeprom.commit().unwrap();
        }
        let bus = close(eeprom);
        prop_assert_eq!(bus.erase_count(), dirty_commits * rows_per_commit);
    }
}
