//! Known HAP service and characteristic type identifiers, short form

/// Service type identifiers
pub mod service_types {
    pub const HAP_PROTOCOL_INFO: &str = "A2";
    pub const ACCESSORY_INFO: &str = "3E";
    pub const AIR_PURIFIER: &str = "BB";
    pub const AIR_QUALITY_SENSOR: &str = "8D";
    pub const AUDIO_STREAM_MANAGEMENT: &str = "127";
    pub const BATTERY_SERVICE: &str = "96";
    pub const CAMERA_RTP_STREAM_MANAGEMENT: &str = "110";
    pub const CARBON_DIOXIDE_SENSOR: &str = "97";
    pub const CARBON_MONOXIDE_SENSOR: &str = "7F";
    pub const CONTACT_SENSOR: &str = "80";
    pub const DATA_STREAM_TRANSPORT_MANAGEMENT: &str = "129";
    pub const DOOR: &str = "81";
    pub const DOORBELL: &str = "121";
    pub const FAN: &str = "B7";
    pub const FAUCET: &str = "D7";
    pub const FILTER_MAINTENANCE: &str = "BA";
    pub const GARAGE_DOOR_OPENER: &str = "41";
    pub const HEATER_COOLER: &str = "BC";
    pub const HUMIDIFIER_DEHUMIDIFIER: &str = "BD";
    pub const HUMIDITY_SENSOR: &str = "82";
    pub const IRRIGATION_SYSTEM: &str = "CF";
    pub const LEAK_SENSOR: &str = "83";
    pub const LIGHT_BULB: &str = "43";
    pub const LIGHT_SENSOR: &str = "84";
    pub const LOCK_MANAGEMENT: &str = "44";
    pub const LOCK_MECHANISM: &str = "45";
    pub const MICROPHONE: &str = "112";
    pub const MOTION_SENSOR: &str = "85";
    pub const OCCUPANCY_SENSOR: &str = "86";
    pub const OUTLET: &str = "47";
    pub const SECURITY_SYSTEM: &str = "7E";
    pub const SERVICE_LABEL: &str = "CC";
    pub const SIRI: &str = "133";
    pub const SLAT: &str = "B9";
    pub const SMOKE_SENSOR: &str = "87";
    pub const SPEAKER: &str = "113";
    pub const STATELESS_PROGRAMMABLE_SWITCH: &str = "89";
    pub const SWITCH: &str = "49";
    pub const TARGET_CONTROL: &str = "125";
    pub const TARGET_CONTROL_MANAGEMENT: &str = "122";
    pub const TEMPERATURE_SENSOR: &str = "8A";
    pub const THERMOSTAT: &str = "4A";
    pub const VALVE: &str = "D0";
    pub const WINDOW: &str = "8B";
    pub const WINDOW_COVERING: &str = "8C";
}

/// Characteristic type identifiers
pub mod characteristic_types {
    pub const IDENTIFY: &str = "14";
    pub const MANUFACTURER: &str = "20";
    pub const MODEL: &str = "21";
    pub const NAME: &str = "23";
    pub const SERIAL_NUMBER: &str = "30";
    pub const VERSION: &str = "37";
    pub const FIRMWARE_REVISION: &str = "52";
    pub const HARDWARE_REVISION: &str = "53";
    pub const ON: &str = "25";
    pub const BRIGHTNESS: &str = "8";
    pub const ACCESSORY_FLAGS: &str = "A6";
    pub const ACTIVE: &str = "B0";
    pub const ACTIVE_IDENTIFIER: &str = "E7";
    pub const ADMINISTRATOR_ONLY_ACCESS: &str = "1";
    pub const AUDIO_FEEDBACK: &str = "5";
    pub const AIR_PARTICULATE_SIZE: &str = "65";
    pub const AIR_QUALITY: &str = "95";
    pub const BATTERY_LEVEL: &str = "68";
    pub const BUTTON_EVENT: &str = "126";
    pub const CARBON_MONOXIDE_LEVEL: &str = "90";
    pub const CARBON_MONOXIDE_PEAK_LEVEL: &str = "91";
    pub const CARBON_MONOXIDE_DETECTED: &str = "69";
    pub const CARBON_DIOXIDE_LEVEL: &str = "93";
    pub const CARBON_DIOXIDE_PEAK_LEVEL: &str = "94";
    pub const CARBON_DIOXIDE_DETECTED: &str = "92";
    pub const CHARGING_STATE: &str = "8F";
    pub const COOLING_THRESHOLD_TEMPERATURE: &str = "D";
    pub const COLOR_TEMPERATURE: &str = "CE";
    pub const CONTACT_SENSOR_STATE: &str = "6A";
    pub const CURRENT_AMBIENT_LIGHT_LEVEL: &str = "6B";
    pub const CURRENT_HORIZONTAL_TILT_ANGLE: &str = "6C";
    pub const CURRENT_AIR_PURIFIER_STATE: &str = "A9";
    pub const CURRENT_SLAT_STATE: &str = "AA";
    pub const CURRENT_POSITION: &str = "6D";
    pub const CURRENT_VERTICAL_TILT_ANGLE: &str = "6E";
    pub const CURRENT_HUMIDIFIER_DEHUMIDIFIER_STATE: &str = "B3";
    pub const CURRENT_DOOR_STATE: &str = "E";
    pub const CURRENT_FAN_STATE: &str = "AF";
    pub const CURRENT_HEATING_COOLING_STATE: &str = "F";
    pub const CURRENT_HEATER_COOLER_STATE: &str = "B1";
    pub const CURRENT_RELATIVE_HUMIDITY: &str = "10";
    pub const CURRENT_TEMPERATURE: &str = "11";
    pub const CURRENT_TILT_ANGLE: &str = "C1";
    pub const DIGITAL_ZOOM: &str = "11D";
    pub const FILTER_LIFE_LEVEL: &str = "AB";
    pub const FILTER_CHANGE_INDICATION: &str = "AC";
    pub const HEATING_THRESHOLD_TEMPERATURE: &str = "12";
    pub const HOLD_POSITION: &str = "6F";
    pub const HUE: &str = "13";
    pub const IMAGE_ROTATION: &str = "11E";
    pub const IMAGE_MIRRORING: &str = "11F";
    pub const IN_USE: &str = "D2";
    pub const IS_CONFIGURED: &str = "D6";
    pub const LEAK_DETECTED: &str = "70";
    pub const LOCK_CONTROL_POINT: &str = "19";
    pub const LOCK_CURRENT_STATE: &str = "1D";
    pub const LOCK_LAST_KNOWN_ACTION: &str = "1C";
    pub const LOCK_MANAGEMENT_AUTO_SECURITY_TIMEOUT: &str = "1A";
    pub const LOCK_PHYSICAL_CONTROLS: &str = "A7";
    pub const LOCK_TARGET_STATE: &str = "1E";
    pub const LOGS: &str = "1F";
    pub const MOTION_DETECTED: &str = "22";
    pub const MUTE: &str = "11A";
    pub const NIGHT_VISION: &str = "11B";
    pub const NITROGEN_DIOXIDE_DENSITY: &str = "C4";
    pub const OBSTRUCTION_DETECTED: &str = "24";
    pub const PM25_DENSITY: &str = "C6";
    pub const OCCUPANCY_DETECTED: &str = "71";
    pub const OPTICAL_ZOOM: &str = "11C";
    pub const OUTLET_IN_USE: &str = "26";
    pub const OZONE_DENSITY: &str = "C3";
    pub const PM10_DENSITY: &str = "C7";
    pub const POSITION_STATE: &str = "72";
    pub const PROGRAM_MODE: &str = "D1";
    pub const PROGRAMMABLE_SWITCH_EVENT: &str = "73";
    pub const RELATIVE_HUMIDITY_DEHUMIDIFIER_THRESHOLD: &str = "C9";
    pub const RELATIVE_HUMIDITY_HUMIDIFIER_THRESHOLD: &str = "CA";
    pub const REMAINING_DURATION: &str = "D4";
    pub const RESET_FILTER_INDICATION: &str = "AD";
    pub const ROTATION_DIRECTION: &str = "28";
    pub const ROTATION_SPEED: &str = "29";
    pub const SATURATION: &str = "2F";
    pub const SECURITY_SYSTEM_ALARM_TYPE: &str = "BE";
    pub const SECURITY_SYSTEM_CURRENT_STATE: &str = "66";
    pub const SECURITY_SYSTEM_TARGET_STATE: &str = "67";
    pub const SELECTED_AUDIO_STREAM_CONFIGURATION: &str = "128";
    pub const SERVICE_LABEL_INDEX: &str = "CB";
    pub const SERVICE_LABEL_NAMESPACE: &str = "CD";
    pub const SETUP_DATA_STREAM_TRANSPORT: &str = "131";
    pub const SELECTED_RTP_STREAM_CONFIGURATION: &str = "117";
    pub const SETUP_ENDPOINTS: &str = "118";
    pub const SIRI_INPUT_TYPE: &str = "132";
    pub const SLAT_TYPE: &str = "C0";
    pub const SMOKE_DETECTED: &str = "76";
    pub const STATUS_ACTIVE: &str = "75";
    pub const STATUS_FAULT: &str = "77";
    pub const STATUS_JAMMED: &str = "78";
    pub const STATUS_LOW_BATTERY: &str = "79";
    pub const STATUS_TAMPERED: &str = "7A";
    pub const STREAMING_STATUS: &str = "120";
    pub const SUPPORTED_AUDIO_STREAM_CONFIGURATION: &str = "115";
    pub const SUPPORTED_DATA_STREAM_TRANSPORT_CONFIGURATION: &str = "130";
    pub const SUPPORTED_RTP_CONFIGURATION: &str = "116";
    pub const SUPPORTED_VIDEO_STREAM_CONFIGURATION: &str = "114";
    pub const SULPHUR_DIOXIDE_DENSITY: &str = "C5";
    pub const SWING_MODE: &str = "B6";
    pub const TARGET_AIR_PURIFIER_STATE: &str = "A8";
    pub const TARGET_FAN_STATE: &str = "BF";
    pub const TARGET_TILT_ANGLE: &str = "C2";
    pub const TARGET_HEATER_COOLER_STATE: &str = "B2";
    pub const SET_DURATION: &str = "D3";
    pub const TARGET_CONTROL_SUPPORTED_CONFIGURATION: &str = "123";
    pub const TARGET_CONTROL_LIST: &str = "124";
    pub const TARGET_HORIZONTAL_TILT_ANGLE: &str = "7B";
    pub const TARGET_HUMIDIFIER_DEHUMIDIFIER_STATE: &str = "B4";
    pub const TARGET_POSITION: &str = "7C";
    pub const TARGET_DOOR_STATE: &str = "32";
    pub const TARGET_HEATING_COOLING_STATE: &str = "33";
    pub const TARGET_RELATIVE_HUMIDITY: &str = "34";
    pub const TARGET_TEMPERATURE: &str = "35";
    pub const TEMPERATURE_DISPLAY_UNITS: &str = "36";
    pub const TARGET_VERTICAL_TILT_ANGLE: &str = "7D";
    pub const VALVE_TYPE: &str = "D5";
    pub const VOC_DENSITY: &str = "C8";
    pub const VOLUME: &str = "119";
    pub const WATER_LEVEL: &str = "B5";
}

/// Human-readable name of a known service type (short form)
#[must_use]
pub fn service_name(short: &str) -> Option<&'static str> {
    use service_types as t;
    Some(match short {
        t::HAP_PROTOCOL_INFO => "HapProtocolInfo",
        t::ACCESSORY_INFO => "AccessoryInfo",
        t::AIR_PURIFIER => "AirPurifier",
        t::AIR_QUALITY_SENSOR => "AirQualitySensor",
        t::AUDIO_STREAM_MANAGEMENT => "AudioStreamManagement",
        t::BATTERY_SERVICE => "BatteryService",
        t::CAMERA_RTP_STREAM_MANAGEMENT => "CameraRTPStreamManagement",
        t::CARBON_DIOXIDE_SENSOR => "CarbonDioxideSensor",
        t::CARBON_MONOXIDE_SENSOR => "CarbonMonoxideSensor",
        t::CONTACT_SENSOR => "ContactSensor",
        t::DATA_STREAM_TRANSPORT_MANAGEMENT => "DataStreamTransportManagement",
        t::DOOR => "Door",
        t::DOORBELL => "Doorbell",
        t::FAN => "Fan",
        t::FAUCET => "Faucet",
        t::FILTER_MAINTENANCE => "FilterMaintenance",
        t::GARAGE_DOOR_OPENER => "GarageDoorOpener",
        t::HEATER_COOLER => "HeaterCooler",
        t::HUMIDIFIER_DEHUMIDIFIER => "HumidifierDehumidifier",
        t::HUMIDITY_SENSOR => "HumiditySensor",
        t::IRRIGATION_SYSTEM => "IrrigationSystem",
        t::LEAK_SENSOR => "LeakSensor",
        t::LIGHT_BULB => "LightBulb",
        t::LIGHT_SENSOR => "LightSensor",
        t::LOCK_MANAGEMENT => "LockManagement",
        t::LOCK_MECHANISM => "LockMechanism",
        t::MICROPHONE => "Microphone",
        t::MOTION_SENSOR => "MotionSensor",
        t::OCCUPANCY_SENSOR => "OccupancySensor",
        t::OUTLET => "Outlet",
        t::SECURITY_SYSTEM => "SecuritySystem",
        t::SERVICE_LABEL => "ServiceLabel",
        t::SIRI => "Siri",
        t::SLAT => "Slat",
        t::SMOKE_SENSOR => "SmokeSensor",
        t::SPEAKER => "Speaker",
        t::STATELESS_PROGRAMMABLE_SWITCH => "StatelessProgrammableSwitch",
        t::SWITCH => "Switch",
        t::TARGET_CONTROL => "TargetControl",
        t::TARGET_CONTROL_MANAGEMENT => "TargetControlManagement",
        t::TEMPERATURE_SENSOR => "TemperatureSensor",
        t::THERMOSTAT => "Thermostat",
        t::VALVE => "Valve",
        t::WINDOW => "Window",
        t::WINDOW_COVERING => "WindowCovering",
        _ => return None,
    })
}

/// Human-readable name of a known characteristic type (short form)
#[must_use]
pub fn characteristic_name(short: &str) -> Option<&'static str> {
    use characteristic_types as t;
    Some(match short {
        t::IDENTIFY => "Identify",
        t::MANUFACTURER => "Manufacturer",
        t::MODEL => "Model",
        t::NAME => "Name",
        t::SERIAL_NUMBER => "SerialNumber",
        t::VERSION => "Version",
        t::FIRMWARE_REVISION => "FirmwareRevision",
        t::HARDWARE_REVISION => "HardwareRevision",
        t::ON => "On",
        t::BRIGHTNESS => "Brightness",
        t::ACCESSORY_FLAGS => "AccessoryFlags",
        t::ACTIVE => "Active",
        t::ACTIVE_IDENTIFIER => "ActiveIdentifier",
        t::ADMINISTRATOR_ONLY_ACCESS => "AdministratorOnlyAccess",
        t::AUDIO_FEEDBACK => "AudioFeedback",
        t::AIR_PARTICULATE_SIZE => "AirParticulateSize",
        t::AIR_QUALITY => "AirQuality",
        t::BATTERY_LEVEL => "BatteryLevel",
        t::BUTTON_EVENT => "ButtonEvent",
        t::CARBON_MONOXIDE_LEVEL => "CarbonMonoxideLevel",
        t::CARBON_MONOXIDE_PEAK_LEVEL => "CarbonMonoxidePeakLevel",
        t::CARBON_MONOXIDE_DETECTED => "CarbonMonoxideDetected",
        t::CARBON_DIOXIDE_LEVEL => "CarbonDioxideLevel",
        t::CARBON_DIOXIDE_PEAK_LEVEL => "CarbonDioxidePeakLevel",
        t::CARBON_DIOXIDE_DETECTED => "CarbonDioxideDetected",
        t::CHARGING_STATE => "ChargingState",
        t::COOLING_THRESHOLD_TEMPERATURE => "CoolingThresholdTemperature",
        t::COLOR_TEMPERATURE => "ColorTemperature",
        t::CONTACT_SENSOR_STATE => "ContactSensorState",
        t::CURRENT_AMBIENT_LIGHT_LEVEL => "CurrentAmbientLightLevel",
        t::CURRENT_HORIZONTAL_TILT_ANGLE => "CurrentHorizontalTiltAngle",
        t::CURRENT_AIR_PURIFIER_STATE => "CurrentAirPurifierState",
        t::CURRENT_SLAT_STATE => "CurrentSlatState",
        t::CURRENT_POSITION => "CurrentPosition",
        t::CURRENT_VERTICAL_TILT_ANGLE => "CurrentVerticalTiltAngle",
        t::CURRENT_HUMIDIFIER_DEHUMIDIFIER_STATE => {
            "CurrentHumidifierDehumidifierState"
        }
        t::CURRENT_DOOR_STATE => "CurrentDoorState",
        t::CURRENT_FAN_STATE => "CurrentFanState",
        t::CURRENT_HEATING_COOLING_STATE => "CurrentHeatingCoolingState",
        t::CURRENT_HEATER_COOLER_STATE => "CurrentHeaterCoolerState",
        t::CURRENT_RELATIVE_HUMIDITY => "CurrentRelativeHumidity",
        t::CURRENT_TEMPERATURE => "CurrentTemperature",
        t::CURRENT_TILT_ANGLE => "CurrentTiltAngle",
        t::DIGITAL_ZOOM => "DigitalZoom",
        t::FILTER_LIFE_LEVEL => "FilterLifeLevel",
        t::FILTER_CHANGE_INDICATION => "FilterChangeIndication",
        t::HEATING_THRESHOLD_TEMPERATURE => "HeatingThresholdTemperature",
        t::HOLD_POSITION => "HoldPosition",
        t::HUE => "Hue",
        t::IMAGE_ROTATION => "ImageRotation",
        t::IMAGE_MIRRORING => "ImageMirroring",
        t::IN_USE => "InUse",
        t::IS_CONFIGURED => "IsConfigured",
        t::LEAK_DETECTED => "LeakDetected",
        t::LOCK_CONTROL_POINT => "LockControlPoint",
        t::LOCK_CURRENT_STATE => "LockCurrentState",
        t::LOCK_LAST_KNOWN_ACTION => "LockLastKnownAction",
        t::LOCK_MANAGEMENT_AUTO_SECURITY_TIMEOUT => {
            "LockManagementAutoSecurityTimeout"
        }
        t::LOCK_PHYSICAL_CONTROLS => "LockPhysicalControls",
        t::LOCK_TARGET_STATE => "LockTargetState",
        t::LOGS => "Logs",
        t::MOTION_DETECTED => "MotionDetected",
        t::MUTE => "Mute",
        t::NIGHT_VISION => "NightVision",
        t::NITROGEN_DIOXIDE_DENSITY => "NitrogenDioxideDensity",
        t::OBSTRUCTION_DETECTED => "ObstructionDetected",
        t::PM25_DENSITY => "PM25Density",
        t::OCCUPANCY_DETECTED => "OccupancyDetected",
        t::OPTICAL_ZOOM => "OpticalZoom",
        t::OUTLET_IN_USE => "OutletInUse",
        t::OZONE_DENSITY => "OzoneDensity",
        t::PM10_DENSITY => "PM10Density",
        t::POSITION_STATE => "PositionState",
        t::PROGRAM_MODE => "ProgramMode",
        t::PROGRAMMABLE_SWITCH_EVENT => "ProgrammableSwitchEvent",
        t::RELATIVE_HUMIDITY_DEHUMIDIFIER_THRESHOLD => {
            "RelativeHumidityDehumidifierThreshold"
        }
        t::RELATIVE_HUMIDITY_HUMIDIFIER_THRESHOLD => {
            "RelativeHumidityHumidifierThreshold"
        }
        t::REMAINING_DURATION => "RemainingDuration",
        t::RESET_FILTER_INDICATION => "ResetFilterIndication",
        t::ROTATION_DIRECTION => "RotationDirection",
        t::ROTATION_SPEED => "RotationSpeed",
        t::SATURATION => "Saturation",
        t::SECURITY_SYSTEM_ALARM_TYPE => "SecuritySystemAlarmType",
        t::SECURITY_SYSTEM_CURRENT_STATE => "SecuritySystemCurrentState",
        t::SECURITY_SYSTEM_TARGET_STATE => "SecuritySystemTargetState",
        t::SELECTED_AUDIO_STREAM_CONFIGURATION => "SelectedAudioStreamConfiguration",
        t::SERVICE_LABEL_INDEX => "ServiceLabelIndex",
        t::SERVICE_LABEL_NAMESPACE => "ServiceLabelNamespace",
        t::SETUP_DATA_STREAM_TRANSPORT => "SetupDataStreamTransport",
        t::SELECTED_RTP_STREAM_CONFIGURATION => "SelectedRTPStreamConfiguration",
        t::SETUP_ENDPOINTS => "SetupEndpoints",
        t::SIRI_INPUT_TYPE => "SiriInputType",
        t::SLAT_TYPE => "SlatType",
        t::SMOKE_DETECTED => "SmokeDetected",
        t::STATUS_ACTIVE => "StatusActive",
        t::STATUS_FAULT => "StatusFault",
        t::STATUS_JAMMED => "StatusJammed",
        t::STATUS_LOW_BATTERY => "StatusLowBattery",
        t::STATUS_TAMPERED => "StatusTampered",
        t::STREAMING_STATUS => "StreamingStatus",
        t::SUPPORTED_AUDIO_STREAM_CONFIGURATION => {
            "SupportedAudioStreamConfiguration"
        }
        t::SUPPORTED_DATA_STREAM_TRANSPORT_CONFIGURATION => {
            "SupportedDataStreamTransportConfiguration"
        }
        t::SUPPORTED_RTP_CONFIGURATION => "SupportedRTPConfiguration",
        t::SUPPORTED_VIDEO_STREAM_CONFIGURATION => {
            "SupportedVideoStreamConfiguration"
        }
        t::SULPHUR_DIOXIDE_DENSITY => "SulphurDioxideDensity",
        t::SWING_MODE => "SwingMode",
        t::TARGET_AIR_PURIFIER_STATE => "TargetAirPurifierState",
        t::TARGET_FAN_STATE => "TargetFanState",
        t::TARGET_TILT_ANGLE => "TargetTiltAngle",
        t::TARGET_HEATER_COOLER_STATE => "TargetHeaterCoolerState",
        t::SET_DURATION => "SetDuration",
        t::TARGET_CONTROL_SUPPORTED_CONFIGURATION => {
            "TargetControlSupportedConfiguration"
        }
        t::TARGET_CONTROL_LIST => "TargetControlList",
        t::TARGET_HORIZONTAL_TILT_ANGLE => "TargetHorizontalTiltAngle",
        t::TARGET_HUMIDIFIER_DEHUMIDIFIER_STATE => {
            "TargetHumidifierDehumidifierState"
        }
        t::TARGET_POSITION => "TargetPosition",
        t::TARGET_DOOR_STATE => "TargetDoorState",
        t::TARGET_HEATING_COOLING_STATE => "TargetHeatingCoolingState",
        t::TARGET_RELATIVE_HUMIDITY => "TargetRelativeHumidity",
        t::TARGET_TEMPERATURE => "TargetTemperature",
        t::TEMPERATURE_DISPLAY_UNITS => "TemperatureDisplayUnits",
        t::TARGET_VERTICAL_TILT_ANGLE => "TargetVerticalTiltAngle",
        t::VALVE_TYPE => "ValveType",
        t::VOC_DENSITY => "VOCDensity",
        t::VOLUME => "Volume",
        t::WATER_LEVEL => "WaterLevel",
        _ => return None,
    })
}
