//! Representative time zones by calling code.
//!
//! North American numbers are resolved by area code; everything else by
//! country calling code, using the zone of the most populous region when a
//! country spans several.

/// Zone for a number given its calling code and national significant number.
pub fn time_zone(calling_code: u16, national: u64) -> Option<&'static str> {
    if calling_code == 1 {
        return nanp_area_zone(national / 10_000_000);
    }
    calling_code_zone(calling_code)
}

fn nanp_area_zone(area: u64) -> Option<&'static str> {
    let zone = match area {
        // Pacific
        206 | 253 | 360 | 425 | 509 => "America/Los_Angeles",
        209 | 213 | 310 | 323 | 408 | 415 | 510 | 530 | 559 | 562 | 619 | 626 | 650 | 661
        | 707 | 714 | 760 | 805 | 818 | 831 | 858 | 909 | 916 | 925 | 949 => {
            "America/Los_Angeles"
        }
        503 | 541 | 971 => "America/Los_Angeles",
        702 | 725 | 775 => "America/Los_Angeles",
        604 | 250 | 778 => "America/Vancouver",
        // Mountain
        303 | 719 | 720 | 970 => "America/Denver",
        801 | 385 | 435 => "America/Denver",
        505 | 575 => "America/Denver",
        406 => "America/Denver",
        480 | 520 | 602 | 623 | 928 => "America/Phoenix",
        403 | 587 | 780 | 825 => "America/Edmonton",
        // Central
        312 | 773 | 872 | 847 | 630 | 708 | 815 => "America/Chicago",
        214 | 469 | 972 | 713 | 281 | 832 | 210 | 512 | 737 | 817 => "America/Chicago",
        612 | 651 | 763 | 952 => "America/Chicago",
        314 | 636 | 816 => "America/Chicago",
        504 | 225 | 615 | 629 | 901 | 205 => "America/Chicago",
        204 | 431 => "America/Winnipeg",
        // Eastern
        212 | 332 | 347 | 646 | 718 | 917 | 929 | 516 | 631 | 914 => "America/New_York",
        215 | 267 | 412 | 617 | 857 | 202 | 301 | 410 | 703 | 571 => "America/New_York",
        404 | 470 | 678 | 770 | 305 | 786 | 407 | 813 | 904 | 954 => "America/New_York",
        313 | 248 | 216 | 614 | 513 | 704 | 919 | 804 | 973 | 201 => "America/New_York",
        416 | 647 | 437 | 905 | 613 | 343 | 514 | 438 | 450 | 418 => "America/Toronto",
        // Atlantic and beyond
        902 | 782 => "America/Halifax",
        709 => "America/St_Johns",
        907 => "America/Anchorage",
        808 => "Pacific/Honolulu",
        787 | 939 => "America/Puerto_Rico",
        876 | 658 => "America/Jamaica",
        _ => return None,
    };
    Some(zone)
}

fn calling_code_zone(calling_code: u16) -> Option<&'static str> {
    let zone = match calling_code {
        7 => "Europe/Moscow",
        20 => "Africa/Cairo",
        27 => "Africa/Johannesburg",
        30 => "Europe/Athens",
        31 => "Europe/Amsterdam",
        32 => "Europe/Brussels",
        33 => "Europe/Paris",
        34 => "Europe/Madrid",
        36 => "Europe/Budapest",
        39 => "Europe/Rome",
        40 => "Europe/Bucharest",
        41 => "Europe/Zurich",
        43 => "Europe/Vienna",
        44 => "Europe/London",
        45 => "Europe/Copenhagen",
        46 => "Europe/Stockholm",
        47 => "Europe/Oslo",
        48 => "Europe/Warsaw",
        49 => "Europe/Berlin",
        51 => "America/Lima",
        52 => "America/Mexico_City",
        53 => "America/Havana",
        54 => "America/Argentina/Buenos_Aires",
        55 => "America/Sao_Paulo",
        56 => "America/Santiago",
        57 => "America/Bogota",
        58 => "America/Caracas",
        60 => "Asia/Kuala_Lumpur",
        61 => "Australia/Sydney",
        62 => "Asia/Jakarta",
        63 => "Asia/Manila",
        64 => "Pacific/Auckland",
        65 => "Asia/Singapore",
        66 => "Asia/Bangkok",
        81 => "Asia/Tokyo",
        82 => "Asia/Seoul",
        84 => "Asia/Ho_Chi_Minh",
        86 => "Asia/Shanghai",
        90 => "Europe/Istanbul",
        91 => "Asia/Kolkata",
        92 => "Asia/Karachi",
        94 => "Asia/Colombo",
        98 => "Asia/Tehran",
        212 => "Africa/Casablanca",
        213 => "Africa/Algiers",
        216 => "Africa/Tunis",
        234 => "Africa/Lagos",
        254 => "Africa/Nairobi",
        351 => "Europe/Lisbon",
        353 => "Europe/Dublin",
        358 => "Europe/Helsinki",
        380 => "Europe/Kyiv",
        420 => "Europe/Prague",
        852 => "Asia/Hong_Kong",
        880 => "Asia/Dhaka",
        886 => "Asia/Taipei",
        966 => "Asia/Riyadh",
        971 => "Asia/Dubai",
        972 => "Asia/Jerusalem",
        _ => return None,
    };
    Some(zone)
}
