//! Static object model of the in-memory engine.

pub(crate) struct AttributeDef {
    pub name: &'static str,
    pub datatype: &'static str,
    pub is_input: bool,
    pub is_output: bool,
    pub x_unit: Option<&'static str>,
    pub y_unit: Option<&'static str>,
    pub description: &'static str,
}

pub(crate) struct ObjectTypeDef {
    pub name: &'static str,
    pub attributes: &'static [AttributeDef],
}

impl ObjectTypeDef {
    pub fn attribute(&self, name: &str) -> Option<&'static AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

const fn input(
    name: &'static str,
    datatype: &'static str,
    x_unit: Option<&'static str>,
    y_unit: Option<&'static str>,
    description: &'static str,
) -> AttributeDef {
    AttributeDef {
        name,
        datatype,
        is_input: true,
        is_output: false,
        x_unit,
        y_unit,
        description,
    }
}

const fn output(
    name: &'static str,
    datatype: &'static str,
    x_unit: Option<&'static str>,
    y_unit: Option<&'static str>,
    description: &'static str,
) -> AttributeDef {
    AttributeDef {
        name,
        datatype,
        is_input: false,
        is_output: true,
        x_unit,
        y_unit,
        description,
    }
}

/// Object type that every engine instance starts with one instance of.
pub(crate) const GLOBAL_SETTINGS: &str = "global_settings";

pub(crate) const TIME_UNITS: [&str; 3] = ["hour", "minute", "second"];

pub(crate) const COMMANDS: [&str; 7] = [
    "penalty flag",
    "print model",
    "return simres",
    "save series",
    "set code",
    "set time_delay_unit",
    "start sim",
];

pub(crate) const SCHEMA: &[ObjectTypeDef] = &[
    ObjectTypeDef {
        name: "reservoir",
        attributes: &[
            input("max_vol", "double", None, Some("Mm3"), "Maximum storage volume"),
            input("lrl", "double", None, Some("METER"), "Lowest regulated level"),
            input("hrl", "double", None, Some("METER"), "Highest regulated level"),
            input("start_head", "double", None, Some("METER"), "Water level at the start of the horizon"),
            input("vol_head", "xy", Some("Mm3"), Some("METER"), "Water level as a function of stored volume"),
            input("flow_descr", "xy", Some("METER"), Some("M3/S"), "Spillway discharge as a function of water level"),
            input("inflow", "txy", None, Some("M3/S"), "Unregulated inflow"),
            input("energy_value_input", "double", None, Some("NOK/MWH"), "Water value at the end of the horizon"),
            output("storage", "txy", None, Some("Mm3"), "Simulated storage"),
            output("head", "txy", None, Some("METER"), "Simulated water level"),
            output("water_value_global_result", "double", None, Some("NOK/MWH"), "Marginal water value"),
        ],
    },
    ObjectTypeDef {
        name: "plant",
        attributes: &[
            input("outlet_line", "double", None, Some("METER"), "Tailwater level"),
            input("main_loss", "double_array", None, Some("S2/M5"), "Loss factors of the main tunnel"),
            input("penstock_loss", "double_array", None, Some("S2/M5"), "Loss factors per penstock"),
            input("num_gen", "int", None, None, "Number of generators"),
            input("max_q_constr", "txy", None, Some("M3/S"), "Maximum discharge constraint"),
            output("production", "txy", None, Some("MW"), "Simulated production"),
            output("discharge", "txy", None, Some("M3/S"), "Simulated discharge"),
        ],
    },
    ObjectTypeDef {
        name: "generator",
        attributes: &[
            input("penstock", "int", None, None, "Penstock the generator is connected to"),
            input("p_min", "double", None, Some("MW"), "Minimum production"),
            input("p_max", "double", None, Some("MW"), "Maximum production"),
            input("p_nom", "double", None, Some("MW"), "Nominal production"),
            input("startcost", "txy", None, Some("NOK"), "Start-up cost"),
            input("gen_eff_curve", "xy", Some("MW"), Some("%"), "Generator efficiency"),
            input("turb_eff_curves", "xy_array", Some("M3/S"), Some("%"), "Turbine efficiency per net head"),
            input("committed_in", "txy", None, None, "Forced commitment schedule"),
            output("production", "txy", None, Some("MW"), "Simulated production"),
            output("discharge", "txy", None, Some("M3/S"), "Simulated discharge"),
        ],
    },
    ObjectTypeDef {
        name: "market",
        attributes: &[
            input("market_type", "string", None, None, "Market kind"),
            input("load", "txy", None, Some("MW"), "Load obligation"),
            input("max_buy", "txy", None, Some("MW"), "Purchase limit"),
            input("max_sale", "txy", None, Some("MW"), "Sale limit"),
            input("sale_price", "txy", None, Some("NOK/MWH"), "Sale price"),
            input("buy_price", "txy", None, Some("NOK/MWH"), "Purchase price"),
            output("sale", "txy", None, Some("MW"), "Simulated sale"),
            output("buy", "txy", None, Some("MW"), "Simulated purchase"),
        ],
    },
    ObjectTypeDef {
        name: "gate",
        attributes: &[
            input("max_discharge", "double", None, Some("M3/S"), "Maximum discharge"),
            input("functions_meter_m3s", "xyn", Some("METER"), Some("M3/S"), "Discharge per upstream level, by downstream level"),
            input("schedule", "txy", None, Some("M3/S"), "Discharge schedule"),
            output("discharge", "txy", None, Some("M3/S"), "Simulated discharge"),
        ],
    },
    ObjectTypeDef {
        name: "contract",
        attributes: &[
            input("contract_type", "str", None, None, "Contract kind"),
            input("start_date", "datetime", None, None, "First delivery date"),
            input("trade_curves", "xyt", Some("NOK/MWH"), Some("MW"), "Volume-price curves by trade date"),
            input("delivery_points", "string_array", None, None, "Names of the delivery points"),
            input("volumes", "int_array", None, Some("MW"), "Contracted volumes"),
            output("traded", "txy", None, Some("MW"), "Simulated traded volume"),
        ],
    },
    ObjectTypeDef {
        name: GLOBAL_SETTINGS,
        attributes: &[
            input("time_delay_unit", "string", None, None, "Unit of time delays"),
            input("penalty_flag", "bool", None, None, "Report penalties"),
            input("bypass_cost", "double", None, Some("NOK/MM3"), "Cost of bypass discharge"),
            input("mip_flag", "int", None, None, "Use integer commitment"),
        ],
    },
];

pub(crate) fn object_type(name: &str) -> Option<&'static ObjectTypeDef> {
    SCHEMA.iter().find(|t| t.name == name)
}
