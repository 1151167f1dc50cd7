#![no_std]
#![no_main]

// Required for ESP-IDF bootloader compatibility
// Use explicit parameters to ensure correct efuse block revision values
esp_bootloader_esp_idf::esp_app_desc!(
    env!("CARGO_PKG_VERSION"),  // version
    env!("CARGO_PKG_NAME"),     // project_name
    "00:00:00",                 // build_time
    "2025-01-01",               // build_date
    "0.0.0",                    // idf_ver (not using IDF)
    0x10000,                    // mmu_page_size (64KB)
    0,                          // min_efuse_blk_rev_full (accept all)
    u16::MAX                    // max_efuse_blk_rev_full (accept all)
);

use embassy_executor::Spawner;
use esp_backtrace as _;
use esp_hal::gpio::{Input, InputConfig, Pull};
use esp_hal::peripherals::WIFI;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::uart::{Config as UartConfig, Uart, UartRx, UartTx};
use esp_hal::Async;
use static_cell::StaticCell;

use uart_espnow_relay_firmware::capture::{CaptureController, TriggerSignal};
use uart_espnow_relay_firmware::config;
use uart_espnow_relay_firmware::link::espnow::{EspNowLink, EspNowRx, EspNowTx};
use uart_espnow_relay_firmware::link::PeerAddress;
use uart_espnow_relay_firmware::serial::{UartReader, UartWriter};
use uart_espnow_relay_firmware::tasks;
use uart_espnow_relay_firmware::time::EmbassyClock;

/// Set by the edge task, cleared by the capture loop
static TRIGGER: TriggerSignal = TriggerSignal::new();

/// Static executor for embassy
static EXECUTOR: StaticCell<esp_rtos::embassy::Executor> = StaticCell::new();

/// Static cell for esp-radio controller (needed for 'static lifetime)
static RADIO_CONTROLLER: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();

type HostRx = UartReader<UartRx<'static, Async>>;
type HostTx = UartWriter<UartTx<'static, Async>>;

#[esp_hal::main]
fn main() -> ! {
    // Wi-Fi stack allocates from the heap
    esp_alloc::heap_allocator!(size: config::heap::SIZE);

    esp_println::logger::init_logger(log::LevelFilter::Info);

    let peripherals = esp_hal::init(esp_hal::Config::default());

    // Initialise the RTOS scheduler with timer - MUST be done before any async operations
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Host UART, 8N1 (pins per config::pins)
    let uart = Uart::new(
        peripherals.UART1,
        UartConfig::default().with_baudrate(config::serial::BAUD_RATE),
    )
    .unwrap()
    .with_rx(peripherals.GPIO18)
    .with_tx(peripherals.GPIO17)
    .into_async();
    let (uart_rx, uart_tx) = uart.split();

    // Host TX-enable line, idle high
    let trigger_pin = Input::new(peripherals.GPIO2, InputConfig::default().with_pull(Pull::Up));

    let radio_controller = match esp_radio::init() {
        Ok(controller) => Some(&*RADIO_CONTROLLER.init(controller)),
        Err(e) => {
            log::error!("Error initializing radio: {:?}", e);
            None
        }
    };

    // Create and run the embassy executor
    let executor = EXECUTOR.init(esp_rtos::embassy::Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(async_main(
            spawner,
            radio_controller,
            peripherals.WIFI,
            UartReader::new(uart_rx),
            UartWriter::new(uart_tx),
            trigger_pin,
        ));
    })
}

#[embassy_executor::task]
async fn async_main(
    spawner: Spawner,
    radio_controller: Option<&'static esp_radio::Controller<'static>>,
    wifi: WIFI<'static>,
    host_rx: HostRx,
    host_tx: HostTx,
    trigger_pin: Input<'static>,
) {
    // Without a radio the device stays up but relays nothing
    let Some(radio_controller) = radio_controller else {
        return;
    };

    let mut link = match EspNowLink::start(radio_controller, wifi) {
        Ok(link) => link,
        Err(e) => {
            log::error!("Error initializing ESP-NOW: {:?}", e);
            return;
        }
    };

    let peer = PeerAddress::new(config::link::PEER_ADDRESS);
    let peer_result = link.register_peer(&peer);
    let (esp_now_tx, esp_now_rx) = link.split();

    // Receive path is independent of the peer table
    spawner.must_spawn(relay_task(esp_now_rx, host_tx));

    if let Err(e) = peer_result {
        log::error!("Error adding peer: {:?}", e);
        return;
    }

    let controller = CaptureController::new(&TRIGGER, host_rx, esp_now_tx, EmbassyClock, peer);
    spawner.must_spawn(capture_task(controller));
    spawner.must_spawn(trigger_task(trigger_pin));

    log::info!("ESP-NOW initialized and trigger interrupt attached.");
}

/// Wireless to serial passthrough
#[embassy_executor::task]
async fn relay_task(receiver: EspNowRx, writer: HostTx) {
    tasks::relay_task(receiver, writer).await;
}

/// Trigger-driven serial capture and send
#[embassy_executor::task]
async fn capture_task(controller: CaptureController<'static, HostRx, EspNowTx, EmbassyClock>) {
    tasks::capture_task(controller).await;
}

/// Rising edges on the trigger pin
#[embassy_executor::task]
async fn trigger_task(pin: Input<'static>) {
    tasks::trigger_task(pin, &TRIGGER).await;
}
